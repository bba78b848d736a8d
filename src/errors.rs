//! Crate-level error type
//!
//! Every subsystem error folds into [`QueryError`] and keeps its own code.

use thiserror::Error;

use crate::capability::CapabilityError;
use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::materializer::MaterializeError;
use crate::registry::RegistryError;
use crate::transport::StoreError;

/// Result type for engine operations
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `named_view` was given a name the entity does not declare
    #[error("Entity '{entity}' declares no view named '{view}'")]
    UnknownView { entity: String, view: String },
}

impl QueryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Store(err) => err.code(),
            QueryError::Capability(err) => err.code(),
            QueryError::Registry(err) => err.code(),
            QueryError::Executor(err) => err.code(),
            QueryError::Materialize(err) => err.code(),
            QueryError::Config(err) => err.code(),
            QueryError::UnknownView { .. } => "DOCVIEW_UNKNOWN_VIEW",
        }
    }

    /// The store error underneath, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            QueryError::Store(err) => Some(err),
            QueryError::Registry(RegistryError::Store(err)) => Some(err),
            QueryError::Executor(ExecutorError::Store(err)) => Some(err),
            QueryError::Executor(ExecutorError::Registry(RegistryError::Store(err))) => Some(err),
            QueryError::Executor(ExecutorError::ViewUnavailable { source, .. }) => Some(source),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.store_error().map_or(false, StoreError::is_not_found)
    }

    pub fn is_conflict(&self) -> bool {
        self.store_error().map_or(false, StoreError::is_conflict)
    }
}
