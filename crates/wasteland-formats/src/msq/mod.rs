//! MSQ archive container
//!
//! An archive (`GAME1`, `GAME2`) is a plain concatenation of blocks with no
//! directory and no length fields:
//!
//! ```text
//! Block:
//! ├── Header (6 bytes)
//! │   ├── Magic: "msq"
//! │   ├── Game index: '0' or '1'
//! │   ├── seed0
//! │   └── seed1
//! ├── Secure region (encrypted)
//! └── Plain region (unencrypted, may be empty)
//! ```
//!
//! The secure region is XORed with a keystream starting at `seed0 ^ seed1`
//! and advancing by `0x1f` per byte. The running checksum of its plaintext
//! ends at `seed1 << 8 | seed0`; the reader uses that, together with a
//! per-kind rule, to find where the plain region begins (see [`reader`]).
//!
//! The first `map_block_count` blocks of an archive hold maps. The count is
//! not recorded in the file and comes from [`crate::layout`].

pub mod block;
pub mod header;
pub mod reader;

pub use block::{BlockBody, BlockDescriptor};
pub use header::{BlockHeader, HEADER_LEN, MAGIC};
pub use reader::{BlockKind, BoundaryWarning, ReadState, STRINGS_PREFIX};

use crate::error::{FormatResult, ResultExt};

/// Split an archive into blocks.
///
/// Blocks `0..map_block_count` use the map boundary rule; the rest use the
/// generic rule.
pub fn parse_archive(data: &[u8], map_block_count: usize) -> FormatResult<Vec<BlockDescriptor>> {
    let mut blocks = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let index = blocks.len();
        let kind = if index < map_block_count {
            BlockKind::Map
        } else {
            BlockKind::Other
        };

        let block = BlockDescriptor::parse_at(data, offset, kind)
            .with_context(|| format!("block {index} at offset {offset}"))?;
        offset += block.encoded_len();
        blocks.push(block);
    }

    tracing::debug!(
        blocks = blocks.len(),
        map_blocks = map_block_count.min(blocks.len()),
        bytes = data.len(),
        "parsed archive"
    );
    Ok(blocks)
}

/// Encode blocks back into an archive.
///
/// Header seeds are recomputed from each secure region, so edited bodies
/// produce a consistent archive.
pub fn encode_archive(blocks: &[BlockDescriptor]) -> FormatResult<Vec<u8>> {
    let mut out = Vec::with_capacity(blocks.iter().map(BlockDescriptor::encoded_len).sum());
    for (index, block) in blocks.iter().enumerate() {
        let encoded = block.encode().with_context(|| format!("block {index}"))?;
        out.extend_from_slice(&encoded);
    }
    Ok(out)
}
