//! docview - a view-compiling query layer for a document store
//!
//! Turns field conditions into map/reduce views, registers those views on
//! first use, and answers finds and counts through them.
//!
//! Subsystems, leaves first:
//! capability → compiler → registry → executor → materializer → engine

pub mod capability;
pub mod collation;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod materializer;
pub mod observability;
pub mod registry;
pub mod transport;

pub use capability::{CapabilityProfile, StoreVersion};
pub use compiler::{Condition, CustomView, EntityDescriptor, QueryOptions};
pub use config::EngineConfig;
pub use engine::ViewEngine;
pub use errors::{QueryError, QueryResult};
pub use materializer::{Document, Materialize, QueryOutput, Typed};
pub use transport::{DocumentStore, MemoryStore, VersionSource, ViewRow};
