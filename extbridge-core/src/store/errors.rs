/*
    errors.rs - Error types for the settings-backed stores

    Covers the primary key-value store and the shared metadata replica.
    Malformed *request* data never surfaces here; it degrades to an empty
    default before it reaches the store.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Settings backend I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or a persisted document could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (poisoned lock, unusable location, ...)
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
