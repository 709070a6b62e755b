//! Error types for the grnsync engine.

use thiserror::Error;

/// Errors that can occur while translating or reconciling events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Malformed time span: {0}")]
    MalformedSpan(String),

    #[error("Unsupported recurrence: {0}")]
    UnsupportedRecurrence(String),

    #[error("{service} call failed: {message}")]
    Remote { service: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization error: {0}")]
    Auth(String),
}

impl SyncError {
    pub fn remote(service: &str, message: impl Into<String>) -> Self {
        SyncError::Remote {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Translation errors mean "do not write this event"; everything else is
    /// a failure of the run or of a remote call.
    pub fn is_translation(&self) -> bool {
        matches!(
            self,
            SyncError::MalformedSpan(_) | SyncError::UnsupportedRecurrence(_)
        )
    }
}

/// Result type alias for grnsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
