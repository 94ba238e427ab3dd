//! MSQ block header

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use wasteland_crypto::ChecksumSeeds;

use crate::error::{FormatError, FormatResult};

/// Magic bytes at the start of every block
pub const MAGIC: &[u8; 3] = b"msq";

/// Encoded header size in bytes
pub const HEADER_LEN: usize = 6;

fn game_index_from_ascii(byte: u8) -> Result<u8, String> {
    match byte {
        b'0' => Ok(0),
        b'1' => Ok(1),
        other => Err(format!(
            "invalid game index byte 0x{other:02x}: expected '0' or '1'"
        )),
    }
}

/// MSQ block header (6 bytes)
///
/// ```text
/// "msq" | game index ('0' or '1') | seed0 | seed1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little, magic = b"msq")]
pub struct BlockHeader {
    /// Archive the block belongs to (0 = GAME1, 1 = GAME2)
    #[br(try_map = game_index_from_ascii)]
    #[bw(map = |index: &u8| index + b'0')]
    pub game_index: u8,

    /// Low byte of the terminal checksum
    pub seed0: u8,

    /// High byte of the terminal checksum
    pub seed1: u8,
}

impl BlockHeader {
    /// Create a header with the given seeds.
    pub fn new(game_index: u8, seeds: ChecksumSeeds) -> Self {
        Self {
            game_index,
            seed0: seeds.seed0,
            seed1: seeds.seed1,
        }
    }

    /// Cipher and checksum seeds stored in the header.
    pub fn seeds(&self) -> ChecksumSeeds {
        ChecksumSeeds::new(self.seed0, self.seed1)
    }

    /// Parse the header of the block starting at `offset` in `data`.
    pub fn parse_at(data: &[u8], offset: usize) -> FormatResult<Self> {
        let available = data.len().saturating_sub(offset);
        if available < HEADER_LEN {
            return Err(FormatError::truncated("block header", HEADER_LEN, available));
        }

        let raw = &data[offset..offset + HEADER_LEN];
        let header = Self::read(&mut Cursor::new(raw)).map_err(|e| match e {
            binrw::Error::BadMagic { .. } => FormatError::BadMagic {
                offset,
                found: hex::encode(&raw[..MAGIC.len()]),
            },
            other => FormatError::BadHeader {
                offset,
                reason: other.to_string(),
            },
        })?;

        tracing::debug!(
            offset,
            game_index = header.game_index,
            seeds = %hex::encode([header.seed0, header.seed1]),
            "read block header"
        );
        Ok(header)
    }

    /// Validate fields that the encoding cannot represent.
    pub fn validate(&self) -> FormatResult<()> {
        if self.game_index > 1 {
            return Err(FormatError::BadHeader {
                offset: 0,
                reason: format!("game index {} is not 0 or 1", self.game_index),
            });
        }
        Ok(())
    }
}

impl crate::MsqFormat for BlockHeader {
    fn parse(data: &[u8]) -> FormatResult<Self> {
        Self::parse_at(data, 0)
    }

    fn build(&self) -> FormatResult<Vec<u8>> {
        self.validate()?;
        let mut out = Vec::with_capacity(HEADER_LEN);
        self.write(&mut Cursor::new(&mut out))?;
        Ok(out)
    }
}
