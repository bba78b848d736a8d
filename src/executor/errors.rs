//! Executor error types
//!
//! Error codes:
//! - store and registry errors keep their own code
//! - DOCVIEW_VIEW_UNAVAILABLE (view still missing after registration)

use thiserror::Error;

use crate::registry::RegistryError;
use crate::transport::StoreError;

/// Result type for query execution
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The single retry after registration was answered with NotFound again
    #[error("View '{view}' is still missing after registration: {source}")]
    ViewUnavailable {
        view: String,
        #[source]
        source: StoreError,
    },
}

impl ExecutorError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Store(err) => err.code(),
            ExecutorError::Registry(err) => err.code(),
            ExecutorError::ViewUnavailable { .. } => "DOCVIEW_VIEW_UNAVAILABLE",
        }
    }
}
