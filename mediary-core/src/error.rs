//! Error types for Mediary

use thiserror::Error;

/// Result type alias
pub type MediaryResult<T> = Result<T, MediaryError>;

/// Main error type
#[derive(Error, Debug)]
pub enum MediaryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Name conflict: {conflicting_name} (proposed: {proposed_name})")]
    Conflict {
        conflicting_name: String,
        proposed_name: String,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Backend error ({backend}): {message}")]
    Backend { backend: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl MediaryError {
    /// Transient errors that a bounded retry may recover from.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaryError::Network(_) | MediaryError::RateLimited { .. } | MediaryError::Timeout
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, MediaryError::Conflict { .. })
    }
}
