//! Persistence error types.

use thiserror::Error;

/// Errors that can occur while reading or writing durable storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed to read or write
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a snapshot failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// The key cannot be used by this backend
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    /// The store this persistence belonged to no longer exists
    #[error("Store dropped before snapshot could be written")]
    StoreDropped,
}
