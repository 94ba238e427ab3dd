//! NPC table
//!
//! ```text
//! NPC table:
//! ├── 0x0000 (reserved)
//! ├── Pointers (N × u16), base_offset-relative, each 256 past the previous
//! └── Records (N × 256 bytes)
//! ```

use crate::error::{FormatError, FormatResult};
use crate::table::read_pointers;

/// Size of one NPC record
pub const NPC_RECORD_LEN: usize = 256;

/// Opaque 256-byte NPC record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcRecord(pub Vec<u8>);

/// Decoded NPC table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpcTable {
    /// Records in pointer order
    pub npcs: Vec<NpcRecord>,
}

impl NpcTable {
    /// Decode an NPC table located at `base_offset` in the secure region.
    ///
    /// Returns the table and the number of bytes it occupies. Callers handle
    /// an absent table themselves; this always expects the reserved pointer.
    pub fn decode(source: &[u8], base_offset: usize) -> FormatResult<(Self, usize)> {
        if source.len() < 2 {
            return Err(FormatError::truncated("NPC table", 2, source.len()));
        }

        let area = read_pointers(&source[2..], base_offset + 2)?;
        let pointers = area.pointers;
        let pointers_len = 2 + pointers.len() * 2;
        let total = pointers_len + pointers.len() * NPC_RECORD_LEN;
        if source.len() < total {
            return Err(FormatError::truncated("NPC table", total, source.len()));
        }

        for pair in pointers.windows(2) {
            if usize::from(pair[1]) != usize::from(pair[0]) + NPC_RECORD_LEN {
                return Err(FormatError::InvalidPointer(format!(
                    "NPC pointers must be {NPC_RECORD_LEN} bytes apart: {:04x?}",
                    pointers
                )));
            }
        }

        let npcs = source[pointers_len..total]
            .chunks_exact(NPC_RECORD_LEN)
            .map(|record| NpcRecord(record.to_vec()))
            .collect();

        tracing::debug!(base_offset, npcs = pointers.len(), len = total, "read NPC table");
        Ok((Self { npcs }, total))
    }

    /// Encode the table for placement at `base_offset`.
    pub fn encode(&self, base_offset: usize) -> FormatResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&[0, 0]);

        let first = base_offset + 2 + self.npcs.len() * 2;
        for i in 0..self.npcs.len() {
            let pointer = u16::try_from(first + i * NPC_RECORD_LEN).map_err(|_| {
                FormatError::InvalidPointer(format!(
                    "NPC {i} does not fit a 16-bit pointer at base {base_offset:#06x}"
                ))
            })?;
            out.extend_from_slice(&pointer.to_le_bytes());
        }

        for NpcRecord(record) in &self.npcs {
            if record.len() != NPC_RECORD_LEN {
                return Err(FormatError::SizeMismatch {
                    expected: NPC_RECORD_LEN,
                    actual: record.len(),
                });
            }
            out.extend_from_slice(record);
        }
        Ok(out)
    }

    /// Length of [`encode`](Self::encode)'s output.
    pub fn encoded_len(&self) -> usize {
        2 + self.npcs.len() * (2 + NPC_RECORD_LEN)
    }
}
