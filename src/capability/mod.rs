//! Capability adapter
//!
//! Resolves the store version once at connection time and answers every
//! version-dependent question the compiler and executor ask.

mod errors;
mod profile;
mod version;

pub use errors::{CapabilityError, CapabilityResult};
pub use profile::{CapabilityProfile, Feature, LimitParam, LATEST_STORE_VERSION};
pub use version::StoreVersion;
