//! MSQ secure-region stream cipher.
//!
//! The keystream is a single byte that starts at `seed0 ^ seed1` and is
//! incremented by [`KEY_STEP`] (wrapping) after each byte. Encryption and
//! decryption are the same XOR operation.
//!
//! ```rust
//! use wasteland_crypto::{ChecksumSeeds, MsqCipher};
//!
//! let seeds = ChecksumSeeds::new(0x05, 0x0a);
//! let ciphertext = MsqCipher::new(seeds).encrypt(&[0x41, 0x42]);
//! assert_eq!(ciphertext, [0x4e, 0x6c]);
//! ```

use crate::checksum::ChecksumSeeds;

/// Amount added to the key byte after every ciphered byte.
pub const KEY_STEP: u8 = 0x1f;

/// Stream cipher state for one secure region.
///
/// A fresh cipher must be created for every block; the state is the current
/// key byte only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsqCipher {
    key: u8,
}

impl MsqCipher {
    /// Create a cipher positioned at the start of a secure region.
    pub const fn new(seeds: ChecksumSeeds) -> Self {
        Self {
            key: seeds.initial_key(),
        }
    }

    /// Key byte that will be applied to the next byte.
    pub const fn current_key(&self) -> u8 {
        self.key
    }

    /// Key byte applied at `position` bytes into a secure region.
    pub const fn keystream_at(seeds: ChecksumSeeds, position: usize) -> u8 {
        let steps = (position % 256) as u8;
        seeds.initial_key().wrapping_add(steps.wrapping_mul(KEY_STEP))
    }

    fn next_keystream_byte(&mut self) -> u8 {
        let key = self.key;
        self.key = key.wrapping_add(KEY_STEP);
        key
    }

    /// Cipher a single byte and advance the keystream.
    pub fn apply(&mut self, byte: u8) -> u8 {
        byte ^ self.next_keystream_byte()
    }

    /// Encrypt a plaintext secure region.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| self.apply(byte)).collect()
    }

    /// Decrypt a ciphertext secure region.
    ///
    /// Identical to [`encrypt`](Self::encrypt); a fresh cipher with the same
    /// seeds is required.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        self.encrypt(data)
    }

    /// Apply the keystream in place.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte = self.apply(*byte);
        }
    }
}
