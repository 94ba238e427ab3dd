//! Block checksum and header seed bytes.

/// The two checksum bytes stored in an MSQ block header.
///
/// They double as the cipher seed: the initial key byte is
/// `seed0 ^ seed1`, and the checksum expected at the end of the secure region
/// is `seed1 << 8 | seed0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChecksumSeeds {
    /// Low byte of the terminal checksum
    pub seed0: u8,
    /// High byte of the terminal checksum
    pub seed1: u8,
}

impl ChecksumSeeds {
    /// Create seeds from the raw header bytes.
    pub const fn new(seed0: u8, seed1: u8) -> Self {
        Self { seed0, seed1 }
    }

    /// Split a terminal checksum into header seed bytes.
    pub const fn from_checksum(checksum: u16) -> Self {
        Self {
            seed0: (checksum & 0xff) as u8,
            seed1: (checksum >> 8) as u8,
        }
    }

    /// Checksum value the secure region must finish on.
    pub const fn terminal_checksum(self) -> u16 {
        ((self.seed1 as u16) << 8) | self.seed0 as u16
    }

    /// Cipher key byte for the first byte of the secure region.
    pub const fn initial_key(self) -> u8 {
        self.seed0 ^ self.seed1
    }
}

/// Running checksum over the plaintext of a secure region.
///
/// Starts at zero and subtracts every plaintext byte, wrapping at 16 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockChecksum(u16);

impl BlockChecksum {
    /// Create a checksum with the initial value of zero.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Current checksum value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Checksum value after accumulating `byte`, without modifying `self`.
    pub const fn peek(self, byte: u8) -> u16 {
        self.0.wrapping_sub(byte as u16)
    }

    /// Accumulate one plaintext byte.
    pub fn update(&mut self, byte: u8) {
        self.0 = self.peek(byte);
    }

    /// Accumulate a run of plaintext bytes.
    pub fn update_all(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Whether the running value equals the terminal checksum for `seeds`.
    pub const fn matches(self, seeds: ChecksumSeeds) -> bool {
        self.0 == seeds.terminal_checksum()
    }
}

/// Checksum of a complete plaintext secure region.
pub fn block_checksum(plaintext: &[u8]) -> u16 {
    let mut checksum = BlockChecksum::new();
    checksum.update_all(plaintext);
    checksum.value()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_of_empty_region() {
        assert_eq!(block_checksum(&[]), 0);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(block_checksum(&[0x01]), 0xffff);
        assert_eq!(block_checksum(&[0x01, 0x02, 0x03]), 0xfffa);
    }

    #[test]
    fn test_seed_split() {
        let seeds = ChecksumSeeds::from_checksum(0x0a05);
        assert_eq!(seeds, ChecksumSeeds::new(0x05, 0x0a));
        assert_eq!(seeds.terminal_checksum(), 0x0a05);
        assert_eq!(seeds.initial_key(), 0x0f);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut checksum = BlockChecksum::new();
        checksum.update(0x10);
        assert_eq!(checksum.peek(0x01), 0xffef);
        assert_eq!(checksum.value(), 0xfff0);
    }

    #[test]
    fn test_matches_terminal() {
        let data = [0x41, 0x42, 0x00, 0x7f];
        let seeds = ChecksumSeeds::from_checksum(block_checksum(&data));

        let mut checksum = BlockChecksum::new();
        for &byte in &data[..3] {
            checksum.update(byte);
            assert!(!checksum.matches(seeds));
        }
        checksum.update(data[3]);
        assert!(checksum.matches(seeds));
    }
}
