//! Error types for storage operations

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller supplied an invalid value; rejected before any write
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A compare-and-swap update lost the race against a concurrent writer
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// The backing store is unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other failed operation
    #[error("operation failed: {0}")]
    Operation(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
