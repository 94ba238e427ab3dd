//! Secure/plain boundary inference
//!
//! A block body carries no length fields. The reader decrypts bytes one at a
//! time, keeping a running checksum, and leaves the secure region at the first
//! position where the checksum equals the header's terminal value and the
//! boundary rule for the block's kind accepts it:
//!
//! - Map blocks: the next two raw bytes are the strings-area prefix `20 65`.
//! - Other blocks: consuming the next byte would move the checksum away from
//!   the terminal value.
//!
//! The rule is a pure function of `(state, byte, lookahead)`, see [`step`].

use wasteland_crypto::{BlockChecksum, ChecksumSeeds, MsqCipher};

use super::block::BlockBody;
use super::header::MAGIC;
use crate::error::{FormatError, FormatResult};

/// First two bytes of every strings area
pub const STRINGS_PREFIX: [u8; 2] = [0x20, 0x65];

/// Which boundary rule applies to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Block holds a map; its plain region is a strings area
    Map,
    /// Any other block
    Other,
}

/// Reader position relative to the secure/plain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Still decrypting
    Secure {
        /// Cipher positioned at the next byte
        cipher: MsqCipher,
        /// Checksum of everything decrypted so far
        checksum: BlockChecksum,
    },
    /// Past the boundary; bytes are copied verbatim
    Plain,
}

impl ReadState {
    /// Initial state for a block with the given seeds.
    pub fn new(seeds: ChecksumSeeds) -> Self {
        Self::Secure {
            cipher: MsqCipher::new(seeds),
            checksum: BlockChecksum::new(),
        }
    }

    /// Whether the boundary has been crossed.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }
}

/// Where a consumed byte goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Decrypted secure-region byte
    Secure(u8),
    /// Verbatim plain-region byte
    Plain(u8),
}

/// Advance the reader by one raw byte.
///
/// `following` holds the raw bytes after `raw`, up to the end of the block
/// or file; only its first byte is ever inspected.
pub fn step(
    state: ReadState,
    kind: BlockKind,
    seeds: ChecksumSeeds,
    raw: u8,
    following: &[u8],
) -> (ReadState, Emit) {
    let ReadState::Secure {
        mut cipher,
        mut checksum,
    } = state
    else {
        return (ReadState::Plain, Emit::Plain(raw));
    };

    if checksum.matches(seeds) {
        let boundary = match kind {
            BlockKind::Map => following
                .first()
                .is_some_and(|&next| [raw, next] == STRINGS_PREFIX),
            BlockKind::Other => {
                let plain = raw ^ cipher.current_key();
                checksum.peek(plain) != seeds.terminal_checksum()
            }
        };
        if boundary {
            return (ReadState::Plain, Emit::Plain(raw));
        }
    }

    let plain = cipher.apply(raw);
    checksum.update(plain);
    (ReadState::Secure { cipher, checksum }, Emit::Secure(plain))
}

/// Why an inferred boundary is suspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryWarning {
    /// The block ended while still decrypting, with a checksum that never
    /// reached the terminal value
    Unterminated {
        /// Checksum at the end of the block
        checksum: u16,
    },
    /// The checksum reached the terminal value before the accepted boundary
    EarlyTerminal {
        /// Terminal positions rejected by the boundary rule
        skipped: usize,
    },
}

/// Read the body of a block starting at `start`.
///
/// The body ends at the end of `data` or just before the next `msq` magic.
/// At least one byte is always consumed, so a block can never be empty.
pub fn read_body(
    data: &[u8],
    start: usize,
    seeds: ChecksumSeeds,
    kind: BlockKind,
) -> FormatResult<BlockBody> {
    let (body, warning) = scan_body(data, start, seeds, kind)?;

    match warning {
        Some(BoundaryWarning::Unterminated { checksum }) => {
            tracing::warn!(
                offset = start,
                checksum = %hex::encode(checksum.to_be_bytes()),
                expected = %hex::encode(seeds.terminal_checksum().to_be_bytes()),
                "no secure/plain boundary found before block end"
            );
        }
        Some(BoundaryWarning::EarlyTerminal { skipped }) => {
            tracing::warn!(
                offset = start,
                ?kind,
                skipped,
                secure_len = body.secure.len(),
                "checksum reached terminal value before the accepted boundary"
            );
        }
        None => {}
    }

    tracing::debug!(
        offset = start,
        ?kind,
        secure_len = body.secure.len(),
        plain_len = body.plain.len(),
        "read block body"
    );
    Ok(body)
}

/// Run the reader over one block body and diagnose its boundary.
pub fn scan_body(
    data: &[u8],
    start: usize,
    seeds: ChecksumSeeds,
    kind: BlockKind,
) -> FormatResult<(BlockBody, Option<BoundaryWarning>)> {
    if start >= data.len() {
        return Err(FormatError::truncated(
            "block body",
            start + 1,
            data.len(),
        ));
    }

    let mut body = BlockBody::default();
    let mut state = ReadState::new(seeds);
    let mut terminal_hits = 0usize;
    let mut off = start;

    loop {
        if let ReadState::Secure { checksum, .. } = state
            && checksum.matches(seeds)
        {
            terminal_hits += 1;
        }

        let (next, emit) = step(state, kind, seeds, data[off], &data[off + 1..]);
        match emit {
            Emit::Secure(b) => body.secure.push(b),
            Emit::Plain(b) => body.plain.push(b),
        }
        state = next;
        off += 1;

        if off == data.len() || data[off..].starts_with(MAGIC) {
            break;
        }
    }

    let warning = match state {
        ReadState::Secure { checksum, .. } if !checksum.matches(seeds) => {
            Some(BoundaryWarning::Unterminated {
                checksum: checksum.value(),
            })
        }
        ReadState::Plain if terminal_hits > 1 => Some(BoundaryWarning::EarlyTerminal {
            skipped: terminal_hits - 1,
        }),
        _ => None,
    };
    Ok((body, warning))
}
