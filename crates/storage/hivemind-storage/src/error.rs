//! Error types for the storage layer

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key was empty or otherwise unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Namespace was empty or otherwise unusable
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Value could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored document could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            StorageError::Deserialization(err.to_string())
        } else {
            StorageError::Serialization(err.to_string())
        }
    }
}
