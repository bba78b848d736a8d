//! Observability for the query layer
//!
//! - Structured logging (JSON, one line per event, per-engine minimum severity)
//! - Per-engine counters
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here can fail a query.
//!
//! ```ignore
//! use docview::observability::{Event, Logger, MetricsRegistry, Severity};
//!
//! let logger = Logger::new(Severity::Warn);
//! logger.event(Event::ViewMissing, &[("view", "person/find_by_name")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_view_misses();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
