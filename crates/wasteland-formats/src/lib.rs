//! Parsers and builders for Wasteland MSQ save archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many MSQ-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::needless_pass_by_value)] // Owned block bodies
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::missing_errors_doc)] // Every codec returns FormatError
//! This crate reads and writes the `GAME1`/`GAME2` archives of Wasteland. An
//! archive is a sequence of "MSQ" blocks, each with a partially encrypted
//! body; the leading blocks hold maps whose bodies are further split into
//! areas located through a central directory.
//!
//! # Layers
//!
//! - **Container** ([`msq`]): block framing, stream cipher, and the checksum
//!   driven secure/plain boundary inference
//! - **Carving** ([`carve`], [`directory`]): splits a map block into its
//!   tile region, directory, map info, and directory-addressed areas
//! - **Area codecs** ([`table`], [`action`], [`npc`], [`strings`]): pointer
//!   tables, transitions, loot bags, NPC records, and 5-bit compressed strings
//! - **Decode** ([`decode`]): ties the layers together using an
//!   [`ArchiveLayout`](layout::ArchiveLayout)
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every codec that parses also builds
//! - **Fail Fast**: boundaries are inferred, so the first inconsistency is an
//!   error carrying the block, area, and table it came from
//! - **Round-Trip Guarantee**: `parse(build(x)) == x` for values produced by
//!   `parse`
//!
//! ```rust
//! use wasteland_formats::msq::{BlockBody, BlockDescriptor, BlockHeader, encode_archive, parse_archive};
//!
//! let body = BlockBody::new(vec![0x10, 0x20, 0x30], vec![0x20, 0x65, 0x00]);
//! let block = BlockDescriptor {
//!     offset: 0,
//!     header: BlockHeader::new(0, body.seeds()),
//!     body,
//! };
//!
//! let archive = encode_archive(std::slice::from_ref(&block))?;
//! let blocks = parse_archive(&archive, 1)?;
//! assert_eq!(blocks, vec![block]);
//! # Ok::<(), wasteland_formats::FormatError>(())
//! ```

#![warn(missing_docs)]

pub mod action;
/// Map block area carving
///
/// Splits a decrypted map block into the fixed areas at its start and the
/// areas addressed by its central directory, without copying.
pub mod carve;
pub mod decode;
pub mod directory;
pub mod error;
/// Archive layout configuration
///
/// Map block counts and map dimensions are not recorded in the archives and
/// are supplied here, with defaults for the shipped game.
pub mod layout;
pub mod msq;
pub mod npc;
pub mod strings;
pub mod table;

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use decode::{DecodedArchive, DecodedBlock, decode_archive, decode_block};
pub use error::{FormatError, FormatResult, ResultExt};

/// Common trait for fixed records that parse from and build to bytes
pub trait MsqFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> FormatResult<Self>;

    /// Build to bytes
    fn build(&self) -> FormatResult<Vec<u8>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> FormatResult<()> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err(FormatError::SizeMismatch {
                expected: data.len(),
                actual: rebuilt.len(),
            }
            .context("round-trip verification failed"));
        }
        Ok(())
    }
}
