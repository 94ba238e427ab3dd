//! Transitions (action table 10)
//!
//! ```text
//! Transition (5 or 6 bytes):
//! ├── byte 0: bit 7 relative, bit 6 prompt, bits 0-5 string index
//! ├── byte 1: X
//! ├── byte 2: Y
//! ├── byte 3: location
//! ├── byte 4: destination action class
//! └── byte 5: destination selector (only when class < 0xfd)
//! ```

use crate::MsqFormat;
use crate::error::{FormatError, FormatResult, ResultExt};
use crate::table::{Table, read_pointers};

/// Length of a transition without a selector
pub const TRANSITION_MIN_LEN: usize = 5;

/// Length of a transition with a selector
pub const TRANSITION_MAX_LEN: usize = 6;

/// Destination classes at or above this value carry no selector
pub const CLASS_WITHOUT_SELECTOR: u8 = 0xfd;

/// Location value meaning "the location the party came from"
pub const LOCATION_PREVIOUS: u8 = 0xff;

/// A teleport action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    /// Coordinates are relative to the current position
    pub relative: bool,
    /// Ask the player before transitioning
    pub prompt: bool,
    /// Index of the prompt string (6 bits)
    pub string_index: u8,
    /// Destination X
    pub x: u8,
    /// Destination Y
    pub y: u8,
    /// Destination location
    pub location: u8,
    /// Action class applied at the destination
    pub destination_class: u8,
    /// Action selector applied at the destination
    pub destination_selector: Option<u8>,
}

impl Transition {
    /// Decode a transition from the start of `data`.
    ///
    /// Returns the transition and its encoded length.
    pub fn decode(data: &[u8]) -> FormatResult<(Self, usize)> {
        if data.len() < TRANSITION_MIN_LEN {
            return Err(FormatError::truncated(
                "transition",
                TRANSITION_MIN_LEN,
                data.len(),
            ));
        }

        let destination_class = data[4];
        let destination_selector = if destination_class < CLASS_WITHOUT_SELECTOR {
            let Some(&selector) = data.get(5) else {
                return Err(FormatError::truncated(
                    "transition",
                    TRANSITION_MAX_LEN,
                    data.len(),
                ));
            };
            Some(selector)
        } else {
            None
        };

        let transition = Self {
            relative: data[0] & 0x80 != 0,
            prompt: data[0] & 0x40 != 0,
            string_index: data[0] & 0x3f,
            x: data[1],
            y: data[2],
            location: data[3],
            destination_class,
            destination_selector,
        };
        Ok((transition, transition.encoded_len()))
    }

    /// Encoded length: 6 bytes when a selector is present.
    pub fn encoded_len(&self) -> usize {
        if self.destination_class < CLASS_WITHOUT_SELECTOR {
            TRANSITION_MAX_LEN
        } else {
            TRANSITION_MIN_LEN
        }
    }

    /// Encode the transition.
    ///
    /// The selector must be present exactly when the destination class
    /// requires one.
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        let mut b0 = self.string_index & 0x3f;
        if self.relative {
            b0 |= 0x80;
        }
        if self.prompt {
            b0 |= 0x40;
        }

        let mut out = vec![b0, self.x, self.y, self.location, self.destination_class];
        match (self.destination_class < CLASS_WITHOUT_SELECTOR, self.destination_selector) {
            (true, Some(selector)) => out.push(selector),
            (false, None) => {}
            (true, None) => {
                return Err(FormatError::InvalidTag {
                    tag: self.destination_class,
                    reason: "destination class requires a selector".to_string(),
                });
            }
            (false, Some(_)) => {
                return Err(FormatError::InvalidTag {
                    tag: self.destination_class,
                    reason: format!(
                        "destination classes from {CLASS_WITHOUT_SELECTOR:#04x} take no selector"
                    ),
                });
            }
        }
        Ok(out)
    }

    /// Convert a relative transition to an absolute one.
    pub fn make_absolute(&mut self, x: u8, y: u8) {
        self.relative = false;
        self.x = x;
        self.y = y;
    }

    /// Whether the transition leads into a derelict building.
    pub fn is_derelict(&self) -> bool {
        self.location != LOCATION_PREVIOUS && self.location >= 0x80
    }
}

impl MsqFormat for Transition {
    fn parse(data: &[u8]) -> FormatResult<Self> {
        Self::decode(data).map(|(transition, _)| transition)
    }

    fn build(&self) -> FormatResult<Vec<u8>> {
        self.encode()
    }
}

/// Decoded transition table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    /// Transitions in pointer order; `None` for absent slots
    pub entries: Vec<Option<Transition>>,
}

impl TransitionTable {
    /// Decode the transition table located at `base_offset`.
    ///
    /// Each transition is decoded from its pointer onwards; a slot whose
    /// pointer equals the next slot's is absent.
    pub fn decode(table: &[u8], base_offset: usize) -> FormatResult<Self> {
        let area = read_pointers(table, base_offset)?;
        let first = usize::from(area.first);
        let data = &table[area.byte_len()..];

        let entries = area
            .pointers
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                if p == 0 || area.pointers.get(i + 1) == Some(&p) {
                    return Ok(None);
                }
                let start = usize::from(p).checked_sub(first).filter(|&s| s < data.len());
                let Some(start) = start else {
                    return Err(FormatError::InvalidPointer(format!(
                        "transition {i} pointer {p:#06x} outside table data (first {first:#06x}, {} bytes)",
                        data.len()
                    )));
                };
                let (transition, _) =
                    Transition::decode(&data[start..]).with_context(|| format!("transition {i}"))?;
                Ok(Some(transition))
            })
            .collect::<FormatResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Generic table holding the encoded transitions.
    pub fn to_table(&self) -> FormatResult<Table> {
        let elems = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .as_ref()
                    .map(Transition::encode)
                    .transpose()
                    .with_context(|| format!("transition {i}"))
            })
            .collect::<FormatResult<Vec<_>>>()?;
        Ok(Table::new(elems))
    }

    /// Encode the table with pointers relative to `base_offset`.
    pub fn encode(&self, base_offset: usize) -> FormatResult<Vec<u8>> {
        self.to_table()?.encode(base_offset)
    }
}
