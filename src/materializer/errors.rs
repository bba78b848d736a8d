//! Materializer error types
//!
//! Error codes:
//! - DOCVIEW_NOT_A_DOCUMENT
//! - DOCVIEW_DECODE_FAILED
//! - DOCVIEW_BAD_COUNT

use serde_json::Value;
use thiserror::Error;

/// Result type for materialization
pub type MaterializeResult<T> = Result<T, MaterializeError>;

#[derive(Debug, Error)]
pub enum MaterializeError {
    /// A row value is not a JSON object
    #[error("Row value for '{id}' is not a document")]
    NotADocument { id: String },

    /// A row value did not decode into the target type
    #[error("Document '{id}' could not be decoded: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A reduced count is not a non-negative integer
    #[error("Reduced count is not a non-negative integer: {0}")]
    BadCount(Value),
}

impl MaterializeError {
    pub fn code(&self) -> &'static str {
        match self {
            MaterializeError::NotADocument { .. } => "DOCVIEW_NOT_A_DOCUMENT",
            MaterializeError::Decode { .. } => "DOCVIEW_DECODE_FAILED",
            MaterializeError::BadCount(_) => "DOCVIEW_BAD_COUNT",
        }
    }
}
