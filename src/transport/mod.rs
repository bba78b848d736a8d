//! Document store transport boundary
//!
//! The query layer never speaks HTTP itself. It consumes four operations
//! from a [`DocumentStore`] and a version string from a [`VersionSource`].
//!
//! # Outcomes
//!
//! Every operation distinguishes success, NotFound and Conflict. Only a
//! NotFound on a view query is ever handled inside this crate.

mod errors;
mod memory;
mod params;
mod response;

use serde_json::Value;

pub use errors::{StoreError, StoreResult};
pub use memory::{CallSnapshot, MemoryStore};
pub use params::{ViewParams, ViewPath};
pub use response::{SaveReceipt, ViewResponse, ViewRow};

/// Operations consumed from the document store
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id
    fn get(&self, id: &str) -> StoreResult<Value>;

    /// Create or update a document. Updates must carry the current `_rev`.
    fn save(&self, document: &Value) -> StoreResult<SaveReceipt>;

    /// Query a named view of a design document
    fn query_view(&self, path: &ViewPath, params: &ViewParams) -> StoreResult<ViewResponse>;

    /// Evaluate map/reduce sources directly against every document
    fn query_ad_hoc(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse>;
}

/// Source of the store version, read once at connection time
pub trait VersionSource {
    fn server_version(&self) -> StoreResult<String>;
}
