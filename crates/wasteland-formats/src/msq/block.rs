//! Block bodies and descriptors

use wasteland_crypto::{ChecksumSeeds, MsqCipher, block_checksum};

use super::header::{BlockHeader, HEADER_LEN};
use super::reader::{BlockKind, read_body};
use crate::MsqFormat;
use crate::error::FormatResult;

/// Decrypted contents of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBody {
    /// Decrypted secure region
    pub secure: Vec<u8>,
    /// Unencrypted trailing region (empty for most non-map blocks)
    pub plain: Vec<u8>,
}

impl BlockBody {
    /// Create a body from its two regions.
    pub fn new(secure: Vec<u8>, plain: Vec<u8>) -> Self {
        Self { secure, plain }
    }

    /// Seeds a header must carry for this body.
    pub fn seeds(&self) -> ChecksumSeeds {
        ChecksumSeeds::from_checksum(block_checksum(&self.secure))
    }

    /// Total body length in bytes.
    pub fn len(&self) -> usize {
        self.secure.len() + self.plain.len()
    }

    /// Whether both regions are empty.
    pub fn is_empty(&self) -> bool {
        self.secure.is_empty() && self.plain.is_empty()
    }
}

/// One block of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// File offset of the block header
    pub offset: usize,
    /// Block header
    pub header: BlockHeader,
    /// Decrypted body
    pub body: BlockBody,
}

impl BlockDescriptor {
    /// Parse the block starting at `offset`.
    pub fn parse_at(data: &[u8], offset: usize, kind: BlockKind) -> FormatResult<Self> {
        let header = BlockHeader::parse_at(data, offset)?;
        let body = read_body(data, offset + HEADER_LEN, header.seeds(), kind)?;
        Ok(Self {
            offset,
            header,
            body,
        })
    }

    /// Size of the encoded block, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.len()
    }

    /// Encode the block, deriving the header seeds from the secure region.
    ///
    /// The stored header seeds are ignored; only its game index is used.
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        let seeds = self.body.seeds();
        let header = BlockHeader::new(self.header.game_index, seeds);

        let mut out = header.build()?;
        out.reserve(self.body.len());
        out.extend(MsqCipher::new(seeds).encrypt(&self.body.secure));
        out.extend_from_slice(&self.body.plain);
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_block() {
        let block = BlockDescriptor {
            offset: 0,
            header: BlockHeader::new(1, ChecksumSeeds::default()),
            body: BlockBody::new(vec![0x41, 0x42], vec![0x20, 0x65]),
        };

        let encoded = block.encode().unwrap();
        // checksum = -(0x41 + 0x42) = 0xff7d
        assert_eq!(&encoded[..6], b"msq1\x7d\xff");
        assert_eq!(encoded.len(), block.encoded_len());

        let parsed = BlockDescriptor::parse_at(&encoded, 0, BlockKind::Map).unwrap();
        assert_eq!(parsed.body, block.body);
        assert_eq!(parsed.header.seeds(), ChecksumSeeds::new(0x7d, 0xff));
    }
}
