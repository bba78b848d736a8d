//! Entity query engine
//!
//! ```ignore
//! use std::sync::Arc;
//! use docview::{EngineConfig, EntityDescriptor, MemoryStore, QueryOptions, ViewEngine};
//!
//! let store = Arc::new(MemoryStore::latest());
//! let people: ViewEngine<MemoryStore> =
//!     ViewEngine::connect(store, EntityDescriptor::new("Person"), EngineConfig::default())?;
//!
//! let adults = people.find(QueryOptions::new().where_range("age", 18, 130))?;
//! let named_bob = people.count(QueryOptions::new().where_eq("name", "Bob"))?;
//! ```

mod engine;

pub use engine::ViewEngine;
