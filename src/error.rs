//! Error types for the LZMA encoder.

use thiserror::Error;

/// Error variants for encoder construction and encoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The literal context / literal position / position bits are out of range.
    #[error("invalid lzma properties: lc={lc} (max 8), lp={lp} (max 4), pb={pb} (max 4)")]
    InvalidProperties { lc: u32, lp: u32, pb: u32 },

    /// A bit tree was requested with a width outside `1..=16`.
    #[error("invalid bit tree width: {0} (must be between 1 and 16)")]
    InvalidBitTreeWidth(u32),

    /// The dictionary size is outside the range supported by the format.
    #[error("invalid dictionary size: {0}")]
    InvalidDictionarySize(u32),

    /// The nice length is outside `2..=273`.
    #[error("invalid nice length: {0}")]
    InvalidNiceLen(u32),

    /// The match finder returned a match that can't be encoded at the current position.
    #[error("invalid match (distance {distance}, len {len}): {reason}")]
    InvalidMatch {
        distance: u32,
        len: u32,
        reason: &'static str,
    },

    /// The output sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other),
        }
    }
}
