use thiserror::Error;

/// Canonical result for the block layer.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required constituent was absent at construction time.
    #[error("{0}")]
    NullArgument(&'static str),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A size or id did not fit its target integer width.
    #[error("Integer overflow: {0}")]
    Overflow(String),

    #[error("Position {position} out of range for block with {position_count} positions")]
    PositionOutOfRange {
        position: usize,
        position_count: usize,
    },

    #[error("Invalid region [{offset}, {offset}+{length}) for block with {position_count} positions")]
    RegionOutOfRange {
        offset: usize,
        length: usize,
        position_count: usize,
    },

    /// Checked accessor asked for more bytes than the position stores.
    #[error("Cannot read {width} bytes at offset {offset} of position {position} holding {length} bytes")]
    WidthMismatch {
        position: usize,
        offset: usize,
        width: usize,
        length: usize,
    },

    #[error("Unknown block encoding: {0}")]
    UnknownEncoding(String),

    #[error("Corrupt block stream: {0}")]
    Corrupt(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
