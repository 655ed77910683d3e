//! Error types for sync operations.
//!
//! Only these variants cross component boundaries. Transform and
//! summarization failures are degraded locally and never surface here.

use thiserror::Error;

/// Errors raised by the sync engine and its collaborators
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required credential or URL missing (raised before any network call)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-2xx response or transport failure
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// Manifest, source or URL structure violates the schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem failure while writing manifests or content files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation(message.into())
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
