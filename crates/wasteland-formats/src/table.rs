//! Self-describing pointer tables
//!
//! Every list in an MSQ block (action tables, the NPC table, loot and
//! transition lists) uses the same layout:
//!
//! ```text
//! Table:
//! ├── Pointer area (N × u16, little-endian)
//! │   └── 0x0000 = absent element, else base_offset + element offset
//! └── Elements (concatenated, in pointer order)
//! ```
//!
//! There is no element count. The first non-zero pointer addresses the first
//! element, which starts immediately after the pointer area, so its value
//! minus the base offset *is* the size of the pointer area.

use crate::error::{FormatError, FormatResult};

/// Pointers read from the head of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerArea {
    /// Raw pointer values, including absent (zero) entries
    pub pointers: Vec<u16>,
    /// First non-zero pointer
    pub first: u16,
}

impl PointerArea {
    /// Size of the pointer area in bytes.
    pub fn byte_len(&self) -> usize {
        self.pointers.len() * 2
    }
}

fn read_u16(data: &[u8], off: usize) -> FormatResult<u16> {
    match data.get(off..off + 2) {
        Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
        None => Err(FormatError::truncated(
            "table pointer",
            off + 2,
            data.len(),
        )),
    }
}

/// Read the pointer area at the start of `data`.
///
/// `base_offset` is the value pointers are relative to, typically the offset
/// of the table within the secure region. The pointer count is derived solely
/// from the first non-zero pointer.
pub fn read_pointers(data: &[u8], base_offset: usize) -> FormatResult<PointerArea> {
    let mut pointers = Vec::new();
    let first = loop {
        let p = read_u16(data, pointers.len() * 2)?;
        pointers.push(p);
        if p != 0 {
            break p;
        }
    };

    let area_len = usize::from(first)
        .checked_sub(base_offset)
        .ok_or_else(|| {
            FormatError::InvalidPointer(format!(
                "first pointer {first:#06x} precedes base offset {base_offset:#06x}"
            ))
        })?;

    if area_len % 2 != 0 {
        return Err(FormatError::InvalidPointer(format!(
            "pointer area has odd size {area_len}: pointers={pointers:04x?} base={base_offset:#06x}"
        )));
    }

    if area_len < pointers.len() * 2 {
        return Err(FormatError::InvalidPointer(format!(
            "pointer {first:#06x} points inside the pointer area: size={area_len} read={}",
            pointers.len() * 2
        )));
    }

    for i in pointers.len()..area_len / 2 {
        pointers.push(read_u16(data, i * 2)?);
    }

    Ok(PointerArea { pointers, first })
}

/// Decoded pointer table.
///
/// `None` marks an element with no pointer. Elements own their bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table elements in pointer order
    pub elems: Vec<Option<Vec<u8>>>,
}

impl Table {
    /// Create a table from its elements.
    pub fn new(elems: Vec<Option<Vec<u8>>>) -> Self {
        Self { elems }
    }

    /// Number of slots, present or absent.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.elems.get(index).and_then(|e| e.as_deref())
    }

    /// Parse a table from `data`.
    ///
    /// Each element spans from its pointer to the next non-zero pointer, or
    /// to the end of `data` for the last one. Equal adjacent pointers leave
    /// the earlier element empty, which decodes as absent.
    pub fn parse(data: &[u8], base_offset: usize) -> FormatResult<Self> {
        let area = read_pointers(data, base_offset)?;
        let data_start = base_offset + area.byte_len();
        let data_end = base_offset + data.len();

        let mut prev = 0;
        for (i, &p) in area.pointers.iter().enumerate() {
            if p == 0 {
                continue;
            }
            let p = usize::from(p);
            if p < data_start || p >= data_end {
                return Err(FormatError::InvalidPointer(format!(
                    "pointer {i} ({p:#06x}) outside element data [{data_start:#06x}, {data_end:#06x})"
                )));
            }
            if p < prev {
                return Err(FormatError::InvalidPointer(format!(
                    "unsorted pointer list at {i}: {:04x?}",
                    area.pointers
                )));
            }
            prev = p;
        }

        let elems = area
            .pointers
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                if p == 0 {
                    return None;
                }
                let next = area.pointers[i + 1..]
                    .iter()
                    .find(|&&n| n != 0)
                    .map_or(data_end, |&n| usize::from(n));
                let start = usize::from(p) - base_offset;
                let end = next - base_offset;
                (end > start).then(|| data[start..end].to_vec())
            })
            .collect();

        Ok(Self { elems })
    }

    /// Pointer values an encoded table would start with.
    ///
    /// Fails when an element would start past the 16-bit pointer range.
    pub fn pointers(&self, base_offset: usize) -> FormatResult<Vec<u16>> {
        let mut cur = base_offset + self.elems.len() * 2;
        self.elems
            .iter()
            .enumerate()
            .map(|(i, e)| match e {
                Some(bytes) if !bytes.is_empty() => {
                    let p = u16::try_from(cur).map_err(|_| {
                        FormatError::InvalidPointer(format!(
                            "element {i} at {cur:#x} does not fit a 16-bit pointer"
                        ))
                    })?;
                    cur += bytes.len();
                    Ok(p)
                }
                _ => Ok(0),
            })
            .collect()
    }

    /// Encode the table with pointers relative to `base_offset`.
    pub fn encode(&self, base_offset: usize) -> FormatResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for p in self.pointers(base_offset)? {
            out.extend_from_slice(&p.to_le_bytes());
        }
        for bytes in self.elems.iter().flatten() {
            out.extend_from_slice(bytes);
        }
        Ok(out)
    }

    /// Length of [`encode`](Self::encode)'s output.
    pub fn encoded_len(&self) -> usize {
        self.elems.len() * 2 + self.elems.iter().flatten().map(Vec::len).sum::<usize>()
    }
}
