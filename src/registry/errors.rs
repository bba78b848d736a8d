//! Registry error types
//!
//! Error codes:
//! - store errors keep their own code
//! - DOCVIEW_MALFORMED_DESIGN
//! - DOCVIEW_REGISTRY_POISONED

use thiserror::Error;

use crate::transport::StoreError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while materializing a view
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Fetching or saving the design document failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored design document does not have the expected shape
    #[error("Design document '{id}' is malformed: {reason}")]
    MalformedDesign { id: String, reason: String },

    /// A thread panicked while holding a registry lock
    #[error("Registry lock poisoned")]
    Poisoned,
}

impl RegistryError {
    pub fn malformed(id: impl Into<String>, reason: impl ToString) -> Self {
        RegistryError::MalformedDesign {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Store(err) => err.code(),
            RegistryError::MalformedDesign { .. } => "DOCVIEW_MALFORMED_DESIGN",
            RegistryError::Poisoned => "DOCVIEW_REGISTRY_POISONED",
        }
    }

    /// Returns true if saving lost a revision race
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Store(err) if err.is_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_codes_pass_through() {
        let err = RegistryError::from(StoreError::Conflict("_design/person".into()));
        assert_eq!(err.code(), "DOCVIEW_CONFLICT");
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Conflict: _design/person");
    }

    #[test]
    fn test_malformed() {
        let err = RegistryError::malformed("_design/person", "views is not an object");
        assert_eq!(err.code(), "DOCVIEW_MALFORMED_DESIGN");
        assert!(err.to_string().contains("views is not an object"));
    }
}
