//! Result materializer
//!
//! Turns raw view rows into domain objects, counts, or leaves them raw.

mod document;
mod errors;
mod materializer;

pub use document::{Document, Materialize, Typed};
pub use errors::{MaterializeError, MaterializeResult};
pub use materializer::{cap_count, extract_count, QueryOutput, ResultMaterializer};
