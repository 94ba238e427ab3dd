//! Strings area
//!
//! ```text
//! Strings area:
//! ├── Character table (60 bytes)
//! ├── Pointers (N × u16, relative to the end of the character table)
//! └── String groups (5-bit packed, see codec)
//! ```
//!
//! The pointer count is the first pointer divided by two. The final pointer
//! does not start a group and is dropped. The format does not record where
//! the last group ends, so its length is estimated.

use super::codec::decompress_group;
use crate::error::{FormatError, FormatResult, ResultExt};

/// Size of the character table
pub const CHAR_TABLE_LEN: usize = 60;

/// Assumed length of the last string group
// TODO: derive the last group's length by decoding until its final string
// terminator instead of assuming a fixed size.
pub const LAST_STRING_GROUP_ESTIMATE: usize = 10;

/// Decoded strings area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringsArea {
    /// Symbol to character mapping
    pub char_table: [u8; CHAR_TABLE_LEN],
    /// Group pointers, relative to the end of the character table
    pub pointers: Vec<u16>,
    /// Group data, starting at the first pointer
    pub string_data: Vec<u8>,
}

impl StringsArea {
    /// Decode a strings area from the start of `data`.
    ///
    /// Returns the area and the number of bytes it occupies.
    pub fn decode(data: &[u8]) -> FormatResult<(Self, usize)> {
        let Some(table) = data.get(..CHAR_TABLE_LEN) else {
            return Err(FormatError::truncated(
                "character table",
                CHAR_TABLE_LEN,
                data.len(),
            ));
        };
        let mut char_table = [0u8; CHAR_TABLE_LEN];
        char_table.copy_from_slice(table);

        let pointer_at = |off: usize| -> FormatResult<u16> {
            data.get(off..off + 2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .ok_or_else(|| FormatError::truncated("string pointer", off + 2, data.len()))
        };

        let first = usize::from(pointer_at(CHAR_TABLE_LEN)?);
        if first == 0 || first % 2 != 0 {
            return Err(FormatError::InvalidPointer(format!(
                "string pointer area size {first} is not a positive even number"
            )));
        }
        let pointers_end = CHAR_TABLE_LEN + first;
        if pointers_end > data.len() {
            return Err(FormatError::truncated(
                "string pointers",
                pointers_end,
                data.len(),
            ));
        }

        let mut pointers = (CHAR_TABLE_LEN..pointers_end)
            .step_by(2)
            .map(pointer_at)
            .collect::<FormatResult<Vec<_>>>()?;
        pointers.pop();

        let (Some(&group_first), Some(&group_last)) = (pointers.first(), pointers.last()) else {
            return Err(FormatError::InvalidPointer(
                "strings area has no string groups".to_string(),
            ));
        };

        let start = CHAR_TABLE_LEN + usize::from(group_first);
        let end = CHAR_TABLE_LEN + usize::from(group_last) + LAST_STRING_GROUP_ESTIMATE;
        if end > data.len() {
            return Err(FormatError::truncated("string groups", end, data.len()));
        }
        if start > end {
            return Err(FormatError::InvalidPointer(format!(
                "first string group {group_first:#06x} is past the last {group_last:#06x}"
            )));
        }

        tracing::debug!(
            groups = pointers.len(),
            start,
            end,
            available = data.len(),
            "read strings area"
        );

        Ok((
            Self {
                char_table,
                pointers,
                string_data: data[start..end].to_vec(),
            },
            end,
        ))
    }

    /// Raw bytes of each string group.
    pub fn groups(&self) -> FormatResult<Vec<&[u8]>> {
        let Some(&base) = self.pointers.first() else {
            return Ok(Vec::new());
        };

        let mut groups = Vec::with_capacity(self.pointers.len());
        for (i, &p) in self.pointers.iter().enumerate() {
            let start = usize::from(p.wrapping_sub(base));
            let end = self
                .pointers
                .get(i + 1)
                .map_or(self.string_data.len(), |&n| usize::from(n.wrapping_sub(base)));
            let group = self.string_data.get(start..end).ok_or_else(|| {
                FormatError::InvalidPointer(format!(
                    "string group {i} [{start}, {end}) outside {} bytes of string data",
                    self.string_data.len()
                ))
            })?;
            groups.push(group);
        }
        Ok(groups)
    }

    /// Decompress every string group.
    pub fn decompress_all(&self) -> FormatResult<Vec<Vec<u8>>> {
        self.groups()?
            .into_iter()
            .enumerate()
            .map(|(i, group)| {
                decompress_group(&self.char_table, group).with_context(|| format!("string group {i}"))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn area_bytes(pointers: &[u16], groups: &[u8]) -> Vec<u8> {
        let mut data: Vec<u8> = (0..CHAR_TABLE_LEN as u8).map(|i| b'a' + i % 26).collect();
        for p in pointers {
            data.extend_from_slice(&p.to_le_bytes());
        }
        data.extend_from_slice(groups);
        data
    }

    #[test]
    fn test_decode_drops_last_pointer() {
        // Three pointers; the last one (0x0b) is dropped.
        let groups = [0u8; 32];
        let data = area_bytes(&[0x06, 0x08, 0x0b], &groups);

        let (area, len) = StringsArea::decode(&data).unwrap();
        assert_eq!(area.pointers, vec![0x06, 0x08]);
        assert_eq!(len, CHAR_TABLE_LEN + 0x08 + LAST_STRING_GROUP_ESTIMATE);
        assert_eq!(area.string_data.len(), 2 + LAST_STRING_GROUP_ESTIMATE);
        assert_eq!(area.char_table[1], b'b');

        let groups = area.groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), LAST_STRING_GROUP_ESTIMATE);
    }

    #[test]
    fn test_decompress_all() {
        // 0x41 packs symbols 1 and 2 ('b', 'c'); the rest is padding.
        let mut groups = vec![0x41];
        groups.resize(2 + LAST_STRING_GROUP_ESTIMATE, 0);

        let data = area_bytes(&[0x04, 0x06], &groups);
        let (area, _) = StringsArea::decode(&data).unwrap();
        // Only one group survives dropping the last pointer.
        assert_eq!(area.pointers, vec![0x04]);

        let strings = area.decompress_all().unwrap();
        assert_eq!(strings.len(), 1);
        assert_eq!(&strings[0][..2], b"bc");
    }

    #[test]
    fn test_truncated_char_table() {
        let err = StringsArea::decode(&[0x20, 0x65]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                needed: CHAR_TABLE_LEN,
                ..
            }
        ));
    }

    #[test]
    fn test_estimate_past_end_truncated() {
        let data = area_bytes(&[0x04, 0x06], &[0x00; 4]);
        assert!(matches!(
            StringsArea::decode(&data),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_single_pointer_has_no_groups() {
        let data = area_bytes(&[0x02], &[0x00; 16]);
        assert!(matches!(
            StringsArea::decode(&data),
            Err(FormatError::InvalidPointer(_))
        ));
    }

    #[test]
    fn test_control_error_reports_group() {
        let mut groups = vec![0xde, 0x03];
        groups.resize(2 + LAST_STRING_GROUP_ESTIMATE, 0);
        let data = area_bytes(&[0x04, 0x04], &groups);

        let (area, _) = StringsArea::decode(&data).unwrap();
        let err = area.decompress_all().unwrap_err();
        assert!(err.to_string().starts_with("string group 0: invalid control sequence"));
    }
}
