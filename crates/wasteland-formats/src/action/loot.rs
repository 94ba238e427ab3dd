//! Loot bags (action table 9)
//!
//! ```text
//! Loot:
//! ├── byte 0: destination action class (<= 0x0f)
//! ├── byte 1: destination selector
//! └── Elements, until 0xff:
//!     ├── 0xde amount(u16 LE)  fixed cash
//!     ├── 0x5e amount(u16 LE)  random cash
//!     └── id amount             item; id bit 7 = fixed, bits 0-6 = item
//! ```
//!
//! A bag holds at most one cash element.

use crate::MsqFormat;
use crate::error::{FormatError, FormatResult, ResultExt};
use crate::table::Table;

/// Fixed cash element tag
pub const TAG_CASH_FIXED: u8 = 0xde;

/// Random cash element tag
pub const TAG_CASH_RANDOM: u8 = 0x5e;

/// Element list terminator
pub const TERMINATOR: u8 = 0xff;

/// Highest valid destination class
pub const MAX_DESTINATION_CLASS: u8 = 0x0f;

const ITEM_LEN: usize = 2;
const CASH_LEN: usize = 3;

/// Item in a loot bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LootItem {
    /// Always dropped, rather than by chance
    pub fixed: bool,
    /// Item identifier (7 bits)
    pub id: u8,
    /// Quantity
    pub amount: u8,
}

/// Cash in a loot bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LootCash {
    /// Exact amount rather than an upper bound
    pub fixed: bool,
    /// Amount of cash
    pub amount: u16,
}

/// Loot bag definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Loot {
    /// Action class applied once the bag is looted
    pub destination_class: u8,
    /// Action selector applied once the bag is looted
    pub destination_selector: u8,
    /// Items, in file order
    pub items: Vec<LootItem>,
    /// Optional cash element
    pub cash: Option<LootCash>,
}

enum Element {
    Item(LootItem),
    Cash(LootCash),
    End,
}

fn decode_element(data: &[u8]) -> FormatResult<(Element, usize)> {
    match data[0] {
        TERMINATOR => Ok((Element::End, 1)),
        tag @ (TAG_CASH_FIXED | TAG_CASH_RANDOM) => {
            let Some(bytes) = data.get(..CASH_LEN) else {
                return Err(FormatError::truncated("loot cash", CASH_LEN, data.len()));
            };
            let cash = LootCash {
                fixed: tag == TAG_CASH_FIXED,
                amount: u16::from_le_bytes([bytes[1], bytes[2]]),
            };
            Ok((Element::Cash(cash), CASH_LEN))
        }
        id => {
            let Some(&amount) = data.get(1) else {
                return Err(FormatError::truncated("loot item", ITEM_LEN, data.len()));
            };
            let item = LootItem {
                fixed: id & 0x80 != 0,
                id: id & 0x7f,
                amount,
            };
            Ok((Element::Item(item), ITEM_LEN))
        }
    }
}

impl Loot {
    /// Decode a loot bag from the start of `data`.
    ///
    /// Returns the bag and its encoded length.
    pub fn decode(data: &[u8]) -> FormatResult<(Self, usize)> {
        if data.len() < 2 {
            return Err(FormatError::truncated("loot", 2, data.len()));
        }

        if data[0] > MAX_DESTINATION_CLASS {
            return Err(FormatError::InvalidTag {
                tag: data[0],
                reason: format!("loot destination class must be <= {MAX_DESTINATION_CLASS:#04x}"),
            });
        }

        let mut loot = Self {
            destination_class: data[0],
            destination_selector: data[1],
            ..Self::default()
        };

        let mut off = 2;
        loop {
            if off >= data.len() {
                return Err(FormatError::truncated("loot terminator", off + 1, data.len()));
            }

            let (element, len) = decode_element(&data[off..])?;
            match element {
                Element::Item(item) => loot.items.push(item),
                Element::Cash(cash) => {
                    if loot.cash.is_some() {
                        return Err(FormatError::InvalidTag {
                            tag: data[off],
                            reason: "loot bag has more than one cash element".to_string(),
                        });
                    }
                    loot.cash = Some(cash);
                }
                Element::End => {
                    off += len;
                    break;
                }
            }
            off += len;
        }

        Ok((loot, off))
    }

    /// Encode the bag: items, then cash, then the terminator.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.destination_class, self.destination_selector];
        for item in &self.items {
            let mut id = item.id & 0x7f;
            if item.fixed {
                id |= 0x80;
            }
            out.extend_from_slice(&[id, item.amount]);
        }
        if let Some(cash) = self.cash {
            out.push(if cash.fixed {
                TAG_CASH_FIXED
            } else {
                TAG_CASH_RANDOM
            });
            out.extend_from_slice(&cash.amount.to_le_bytes());
        }
        out.push(TERMINATOR);
        out
    }
}

impl MsqFormat for Loot {
    fn parse(data: &[u8]) -> FormatResult<Self> {
        Self::decode(data).map(|(loot, _)| loot)
    }

    fn build(&self) -> FormatResult<Vec<u8>> {
        Ok(self.encode())
    }
}

/// Decoded loot table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LootTable {
    /// Bags in pointer order; `None` for absent slots
    pub bags: Vec<Option<Loot>>,
}

impl LootTable {
    /// Decode every bag of a parsed table.
    pub fn decode(table: &Table) -> FormatResult<Self> {
        let bags = table
            .elems
            .iter()
            .enumerate()
            .map(|(i, elem)| match elem {
                Some(bytes) => Loot::decode(bytes)
                    .map(|(loot, _)| Some(loot))
                    .with_context(|| format!("loot {i}")),
                None => Ok(None),
            })
            .collect::<FormatResult<Vec<_>>>()?;
        Ok(Self { bags })
    }

    /// Generic table holding the encoded bags.
    pub fn to_table(&self) -> Table {
        Table::new(
            self.bags
                .iter()
                .map(|bag| bag.as_ref().map(Loot::encode))
                .collect(),
        )
    }

    /// Encode the table with pointers relative to `base_offset`.
    pub fn encode(&self, base_offset: usize) -> FormatResult<Vec<u8>> {
        self.to_table().encode(base_offset)
    }
}
