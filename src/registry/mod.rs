//! Index registry
//!
//! Materializes generated views into the entity's design document on demand.
//! The design document is created lazily and only ever grows.

mod design;
mod errors;
mod registry;

pub use design::{DesignDocument, ViewFunctions};
pub use errors::{RegistryError, RegistryResult};
pub use registry::{EnsureOutcome, IndexRegistry};
