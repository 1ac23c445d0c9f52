use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Main error type for coraldb operations
#[derive(Clone, Debug, Error)]
pub enum CoralError {
    #[error("wrong magic")]
    WrongMagic,

    #[error("format version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error("unexpected end of data")]
    ShortData,

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("container has no payload segment")]
    NoPayload,

    #[error("index {index} out of bounds for size {size}")]
    OutOfBounds { index: usize, size: usize },

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("bit set is read-only")]
    ReadOnly,

    #[error("{0}")]
    User(String),

    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),
}

impl CoralError {
    pub(crate) fn corrupted(context: impl Into<String>) -> Self {
        CoralError::CorruptedData(context.into())
    }

    pub(crate) fn user(message: impl Into<String>) -> Self {
        CoralError::User(message.into())
    }

    /// Check if this error indicates a malformed or truncated container
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            CoralError::WrongMagic
                | CoralError::UnsupportedVersion(_)
                | CoralError::ShortData
                | CoralError::CorruptedData(_)
                | CoralError::NoPayload
        )
    }
}

impl From<io::Error> for CoralError {
    fn from(err: io::Error) -> Self {
        CoralError::Io(Arc::new(err))
    }
}

/// Result type alias for coraldb operations
pub type Result<T> = std::result::Result<T, CoralError>;
