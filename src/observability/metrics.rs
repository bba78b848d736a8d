//! Query-layer counters
//!
//! Counters only, monotonic, per engine. Relaxed ordering: values are exact
//! once the counted operations have completed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of one engine
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    view_queries: AtomicU64,
    view_misses: AtomicU64,
    views_registered: AtomicU64,
    design_documents_created: AtomicU64,
    ad_hoc_queries: AtomicU64,
    fallback_queries: AtomicU64,
    counts: AtomicU64,
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
    documents_materialized: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_view_queries(&self) {
        self.view_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_view_misses(&self) {
        self.view_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_views_registered(&self) {
        self.views_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_design_documents_created(&self) {
        self.design_documents_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ad_hoc_queries(&self) {
        self.ad_hoc_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the per-key requests issued for one fallback
    pub fn add_fallback_queries(&self, n: u64) {
        self.fallback_queries.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_counts(&self) {
        self.counts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_documents_materialized(&self, n: u64) {
        self.documents_materialized.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            view_queries: self.view_queries.load(Ordering::Relaxed),
            view_misses: self.view_misses.load(Ordering::Relaxed),
            views_registered: self.views_registered.load(Ordering::Relaxed),
            design_documents_created: self.design_documents_created.load(Ordering::Relaxed),
            ad_hoc_queries: self.ad_hoc_queries.load(Ordering::Relaxed),
            fallback_queries: self.fallback_queries.load(Ordering::Relaxed),
            counts: self.counts.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            documents_materialized: self.documents_materialized.load(Ordering::Relaxed),
        }
    }

    /// Renders the counters as one JSON object
    pub fn to_json(&self) -> String {
        // Serializing a struct of u64 cannot fail.
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub view_queries: u64,
    pub view_misses: u64,
    pub views_registered: u64,
    pub design_documents_created: u64,
    pub ad_hoc_queries: u64,
    pub fallback_queries: u64,
    pub counts: u64,
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub documents_materialized: u64,
}
