//! # Transport Errors
//!
//! The three outcomes every store operation must keep distinguishable.
//! Nothing in this crate rewrites them: a conflict or transport failure
//! reaches the caller exactly as the store reported it.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Document, design document or view is absent (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Revision mismatch on save (409/412)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Returns the HTTP status this error corresponds to
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::Conflict(_) => 409,
            StoreError::Transport(_) => 500,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "DOCVIEW_NOT_FOUND",
            StoreError::Conflict(_) => "DOCVIEW_CONFLICT",
            StoreError::Transport(_) => "DOCVIEW_TRANSPORT",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}
