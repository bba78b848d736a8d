//! Query executor
//!
//! Runs compiled queries, recovers from exactly one "view missing" signal
//! per request by registering the view, and merges per-key fallback rows.

mod errors;
mod executor;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
