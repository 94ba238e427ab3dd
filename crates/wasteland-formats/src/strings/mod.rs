//! Map strings: the plain region of a map block
//!
//! Strings are stored in groups compressed to 5 bits per character against a
//! per-map character table. See [`area`] for the container and [`codec`] for
//! the bit packing.

pub mod area;
pub mod codec;

pub use area::{CHAR_TABLE_LEN, LAST_STRING_GROUP_ESTIMATE, StringsArea};
pub use codec::{CODE_CAPITALIZE, CODE_SHIFT, decompress_group};
