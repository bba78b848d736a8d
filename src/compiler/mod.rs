//! Key compiler subsystem
//!
//! Derives, per query, the view that answers it and the key parameters
//! that select from it.
//!
//! # Design Principles
//!
//! - Deterministic: same field set and operation → same view name
//! - Pure: no network access, no shared state
//! - Literal: malformed ranges are passed through, not rejected
//!
//! # Encoding Precedence (strict order)
//!
//! 1. Any range condition → start/end key pair
//! 2. Any discrete set → list of exact keys
//! 3. Otherwise → one exact key

mod compiler;
mod entity;
mod fields;
mod functions;
mod keys;
mod options;
mod view;

pub use compiler::{CompiledQuery, KeyCompiler, QueryKind, ViewRequest};
pub use entity::{CustomView, EntityDescriptor};
pub use fields::{normalize_field, normalized_conditions, SearchSpec, ID_FIELD, REV_FIELD};
pub use functions::{count_reduce_function, map_function};
pub use keys::{as_key_array, KeyEncoding};
pub use options::{Condition, QueryOptions};
pub use view::{view_name, ViewDefinition, ViewPrefix};
