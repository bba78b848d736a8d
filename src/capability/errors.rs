//! Capability error types
//!
//! Error codes:
//! - DOCVIEW_INVALID_VERSION
//! - DOCVIEW_CAPABILITY_MISMATCH

use thiserror::Error;

use super::profile::Feature;
use super::version::StoreVersion;

/// Result type for capability operations
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Capability errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Version string could not be parsed
    #[error("Invalid store version: '{0}'")]
    InvalidVersion(String),

    /// Store version lacks a feature that has no fallback at the call site
    #[error("Store version {version} does not support {}", feature.as_str())]
    Unsupported {
        feature: Feature,
        version: StoreVersion,
    },
}

impl CapabilityError {
    /// Create an invalid version error
    pub fn invalid_version(input: impl Into<String>) -> Self {
        CapabilityError::InvalidVersion(input.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CapabilityError::InvalidVersion(_) => "DOCVIEW_INVALID_VERSION",
            CapabilityError::Unsupported { .. } => "DOCVIEW_CAPABILITY_MISMATCH",
        }
    }
}
