//! Error types shared by every MSQ codec

use thiserror::Error;

/// Errors raised while decoding or encoding MSQ data
///
/// Boundary inference makes a silent misparse the most likely failure, so
/// codecs fail on the first inconsistency and callers wrap the error with the
/// block, area, or table index it came from (see [`FormatError::context`]).
#[derive(Debug, Error)]
pub enum FormatError {
    /// Fewer bytes available than a fixed or computed minimum
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        /// What was being read
        what: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Block does not start with the `msq` magic
    #[error("invalid block magic at offset {offset}: expected [6d 73 71], got [{found}]")]
    BadMagic {
        /// File offset of the block
        offset: usize,
        /// Hex dump of the bytes found instead
        found: String,
    },

    /// Block header is framed correctly but holds an invalid value
    #[error("invalid block header at offset {offset}: {reason}")]
    BadHeader {
        /// File offset of the block
        offset: usize,
        /// What is wrong with the header
        reason: String,
    },

    /// Out-of-range, unsorted, or structurally impossible pointer
    #[error("invalid pointer: {0}")]
    InvalidPointer(String),

    /// Unknown or misplaced record discriminator byte
    #[error("invalid tag 0x{tag:02x}: {reason}")]
    InvalidTag {
        /// Offending byte
        tag: u8,
        /// Why the tag was rejected
        reason: String,
    },

    /// Control code repeated before it was consumed
    #[error("invalid control sequence: symbol 0x{symbol:02x} repeated at symbol {position}")]
    InvalidControlSequence {
        /// Control code that was repeated
        symbol: u8,
        /// Index of the repeated symbol in the group
        position: usize,
    },

    /// Replacement area differs in length from the original
    #[error("size mismatch: original is {expected} bytes, replacement is {actual} bytes")]
    SizeMismatch {
        /// Length of the original area
        expected: usize,
        /// Length of the replacement
        actual: usize,
    },

    /// Map dimensions that cannot describe a tile region
    #[error("invalid map dimensions {width}x{height}: width must be even")]
    InvalidDimensions {
        /// Map width in tiles
        width: usize,
        /// Map height in tiles
        height: usize,
    },

    /// Binary parsing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Error annotated with the region that failed to parse
    #[error("{context}: {source}")]
    Context {
        /// Location description, e.g. `block 3` or `action table 10`
        context: String,
        /// Underlying error
        #[source]
        source: Box<FormatError>,
    },
}

impl FormatError {
    /// Shorthand for a [`FormatError::Truncated`] error.
    pub fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }

    /// Wrap this error with a location description.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, with every context layer removed.
    pub fn root_cause(&self) -> &Self {
        let mut err = self;
        while let Self::Context { source, .. } = err {
            err = &**source;
        }
        err
    }
}

/// Attach location context to a failing [`FormatResult`].
pub trait ResultExt<T> {
    /// Wrap the error, if any, with a lazily built location description.
    fn with_context<C, F>(self, f: F) -> FormatResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for FormatResult<T> {
    fn with_context<C, F>(self, f: F) -> FormatResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|err| err.context(f()))
    }
}

/// Result type for MSQ format operations
pub type FormatResult<T> = Result<T, FormatError>;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain_display() {
        let err = FormatError::truncated("transition", 5, 4)
            .context("action table 10")
            .context("block 2");

        assert_eq!(
            err.to_string(),
            "block 2: action table 10: truncated transition: need 5 bytes, have 4"
        );
        assert!(matches!(
            err.root_cause(),
            FormatError::Truncated { needed: 5, .. }
        ));
    }

    #[test]
    fn test_result_ext() {
        let result: FormatResult<()> = Err(FormatError::InvalidPointer("p=3".to_string()));
        let err = result.with_context(|| "NPC table").unwrap_err();

        assert_eq!(err.to_string(), "NPC table: invalid pointer: p=3");
        assert!(matches!(err.root_cause(), FormatError::InvalidPointer(_)));
    }

    #[test]
    fn test_root_cause_without_context() {
        let err = FormatError::SizeMismatch {
            expected: 10,
            actual: 12,
        };
        assert!(std::ptr::eq(err.root_cause(), &err));
    }
}
