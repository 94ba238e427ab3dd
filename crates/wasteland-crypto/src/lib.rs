//! Cryptographic primitives for Wasteland MSQ save archives
//!
//! Every MSQ block in a `GAME1`/`GAME2` archive starts with a ciphered
//! "secure" region. This crate provides the two primitives needed to read and
//! write that region:
//!
//! - **Stream cipher**: a single-byte key that advances by `0x1f` after every
//!   byte, seeded from the two checksum bytes stored in the block header
//! - **Block checksum**: a 16-bit running difference over the plaintext whose
//!   terminal value is stored in the same two header bytes
//!
//! The cipher carries no length information. Callers decide where the secure
//! region ends by watching the running checksum, which is why both
//! primitives expose byte-at-a-time operations.
//!
//! # Examples
//!
//! ```
//! use wasteland_crypto::{block_checksum, ChecksumSeeds, MsqCipher};
//!
//! let plaintext = b"Quartz";
//! let seeds = ChecksumSeeds::from_checksum(block_checksum(plaintext));
//!
//! let ciphertext = MsqCipher::new(seeds).encrypt(plaintext);
//! let decrypted = MsqCipher::new(seeds).decrypt(&ciphertext);
//!
//! assert_eq!(plaintext, &decrypted[..]);
//! ```

#![warn(missing_docs)]

pub mod checksum;
pub mod cipher;

pub use checksum::{BlockChecksum, ChecksumSeeds, block_checksum};
pub use cipher::{KEY_STEP, MsqCipher};
