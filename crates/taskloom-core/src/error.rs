//! Error types for the storage contract.

use thiserror::Error;

/// Errors raised by [`Store`](crate::store::Store) implementations.
///
/// The in-memory reference store is infallible in practice, but real
/// backends suspend on I/O and can fail; a store failure is fatal to the
/// operation that hit it; there is no automatic retry.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity with the given id does not exist.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The backend rejected or failed the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// An entity could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::Backend(_) => "BACKEND_ERROR",
            StoreError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
