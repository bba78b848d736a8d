//! View compilation and registration tests
//!
//! Views are named from the sorted field set alone, created on the first
//! miss, and never written twice.

mod common;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use common::{engine, ids, seeded_store, student};
use docview::transport::{SaveReceipt, StoreError, StoreResult, ViewParams, ViewPath, ViewResponse};
use docview::{DocumentStore, EngineConfig, MemoryStore, QueryOptions, VersionSource, ViewEngine};
use serde_json::{json, Value};

fn view_names(store: &MemoryStore) -> Vec<String> {
    let design = store.peek("_design/student").unwrap();
    let mut names: Vec<String> = design["views"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

// =============================================================================
// VIEW NAMING
// =============================================================================

#[test]
fn test_view_name_depends_only_on_fields() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);

    engine
        .find(QueryOptions::new().where_eq("name", "Cy").where_eq("age", 16))
        .unwrap();
    engine
        .find(QueryOptions::new().where_eq("age", 14).where_eq("name", "Ada"))
        .unwrap();
    engine
        .find(QueryOptions::new().where_range("age", 1, 99).where_eq("name", "Ben"))
        .unwrap();

    assert_eq!(view_names(&store), vec!["find_by_age_and_name"]);
}

#[test]
fn test_count_reuses_find_view_when_reduce_available() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);

    engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    assert_eq!(engine.count(QueryOptions::new().where_eq("grade", 11)).unwrap(), 2);

    assert_eq!(view_names(&store), vec!["find_by_grade"]);
    let design = store.peek("_design/student").unwrap();
    assert!(design["views"]["find_by_grade"]["reduce"].is_string());
}

#[test]
fn test_legacy_store_gets_separate_count_view() {
    let store = seeded_store("0.8.0");
    let engine = engine(&store);

    engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    assert_eq!(engine.count(QueryOptions::new().where_eq("grade", 11)).unwrap(), 2);

    assert_eq!(view_names(&store), vec!["count_by_grade", "find_by_grade"]);
    let design = store.peek("_design/student").unwrap();
    assert!(design["views"]["find_by_grade"].get("reduce").is_none());
}

#[test]
fn test_default_key_is_creation_timestamp() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);

    let all = engine.find(QueryOptions::new()).unwrap();
    assert_eq!(ids(&all), vec!["s1", "s2", "s3", "s4", "s5"]);
    assert_eq!(view_names(&store), vec!["find_by_created_at"]);
}

#[test]
fn test_default_key_is_id_without_timestamp() {
    let store = seeded_store("0.9.0");
    let engine: ViewEngine<MemoryStore> = ViewEngine::connect(
        Arc::clone(&store),
        docview::EntityDescriptor::new("Student"),
        EngineConfig::default(),
    )
    .unwrap();

    engine.find(QueryOptions::new()).unwrap();
    assert_eq!(view_names(&store), vec!["find_by__id"]);
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[test]
fn test_miss_then_hit() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);
    let before = store.calls();

    let first = engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    let after_first = store.calls();
    assert_eq!(ids(&first), vec!["s3", "s5"]);
    assert_eq!(after_first.view_queries - before.view_queries, 2);
    assert_eq!(after_first.gets - before.gets, 1);
    assert_eq!(after_first.saves - before.saves, 1);

    let second = engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    let after_second = store.calls();
    assert_eq!(ids(&second), ids(&first));
    assert_eq!(after_second.view_queries - after_first.view_queries, 1);
    assert_eq!(after_second.gets, after_first.gets);
    assert_eq!(after_second.saves, after_first.saves);

    let metrics = engine.metrics();
    assert_eq!(metrics.view_misses, 1);
    assert_eq!(metrics.design_documents_created, 1);
    assert_eq!(metrics.queries_executed, 2);
}

#[test]
fn test_extending_design_document_preserves_members() {
    let store = seeded_store("0.9.0");
    store
        .save(&json!({
            "_id": "_design/student",
            "language": "javascript",
            "views": { "by_age": { "map": common::STUDENT_MAP_BY_AGE } }
        }))
        .unwrap();
    let engine = engine(&store);

    engine.find(QueryOptions::new().where_eq("name", "Ada")).unwrap();

    let design = store.peek("_design/student").unwrap();
    assert_eq!(design["language"], "javascript");
    assert_eq!(design["views"]["by_age"]["map"], common::STUDENT_MAP_BY_AGE);
    assert!(design["views"]["find_by_name"]["map"].is_string());
    assert!(design["_rev"].as_str().unwrap().starts_with("2-"));
    assert_eq!(engine.metrics().views_registered, 1);
    assert_eq!(engine.metrics().design_documents_created, 0);
}

#[test]
fn test_two_engines_share_design_document() {
    let store = seeded_store("0.9.0");
    let first = engine(&store);
    let second = engine(&store);

    first.find(QueryOptions::new().where_eq("grade", 9)).unwrap();
    let saves = store.calls().saves;

    // The second engine's cache is empty, but the stored view is found.
    second.find(QueryOptions::new().where_eq("grade", 10)).unwrap();
    assert_eq!(store.calls().saves, saves);
}

#[test]
fn test_concurrent_misses_register_once() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);
    let saves_before = store.calls().saves;

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let found = engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
                assert_eq!(found.len(), 2);
            });
        }
    });

    assert_eq!(store.calls().saves - saves_before, 1);
    assert_eq!(engine.registry().known_views().unwrap(), vec!["find_by_grade"]);
}

#[test]
fn test_ad_hoc_never_registers() {
    let store = seeded_store("0.9.0");
    let engine = engine(&store);

    let found = engine
        .find(QueryOptions::new().where_eq("grade", 11).ad_hoc())
        .unwrap();
    assert_eq!(ids(&found), vec!["s3", "s5"]);
    assert!(store.peek("_design/student").is_none());
    assert_eq!(store.calls().ad_hoc_queries, 1);
    assert_eq!(engine.metrics().ad_hoc_queries, 1);
}

// =============================================================================
// FAILURE PROPAGATION
// =============================================================================

/// Stores design documents but never serves a view
struct ViewlessStore {
    inner: MemoryStore,
}

impl DocumentStore for ViewlessStore {
    fn get(&self, id: &str) -> StoreResult<Value> {
        self.inner.get(id)
    }

    fn save(&self, document: &Value) -> StoreResult<SaveReceipt> {
        self.inner.save(document)
    }

    fn query_view(&self, path: &ViewPath, _params: &ViewParams) -> StoreResult<ViewResponse> {
        Err(StoreError::NotFound(format!("view '{}'", path)))
    }

    fn query_ad_hoc(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse> {
        self.inner.query_ad_hoc(map, reduce, params)
    }
}

impl VersionSource for ViewlessStore {
    fn server_version(&self) -> StoreResult<String> {
        Ok("0.9.0".to_string())
    }
}

#[test]
fn test_second_miss_fails_without_further_retry() {
    let store = Arc::new(ViewlessStore {
        inner: MemoryStore::latest(),
    });
    let engine: ViewEngine<ViewlessStore> =
        ViewEngine::connect(Arc::clone(&store), student(), EngineConfig::default()).unwrap();

    for attempt in 1..=3u64 {
        let err = engine
            .find(QueryOptions::new().where_eq("grade", 11))
            .unwrap_err();
        assert_eq!(err.code(), "DOCVIEW_VIEW_UNAVAILABLE");
        assert!(err.is_not_found());
        assert_eq!(engine.metrics().view_queries, attempt * 2);
    }

    // Only the first attempt had anything to write.
    assert_eq!(store.inner.calls().saves, 1);
    assert_eq!(engine.metrics().queries_failed, 3);
}

/// Rejects every design document save as a lost revision race
struct ConflictingStore {
    inner: MemoryStore,
    conflicts: AtomicU64,
}

impl DocumentStore for ConflictingStore {
    fn get(&self, id: &str) -> StoreResult<Value> {
        self.inner.get(id)
    }

    fn save(&self, document: &Value) -> StoreResult<SaveReceipt> {
        let id = document["_id"].as_str().unwrap_or_default();
        if id.starts_with("_design/") {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
            return Err(StoreError::Conflict(format!("document '{}'", id)));
        }
        self.inner.save(document)
    }

    fn query_view(&self, path: &ViewPath, params: &ViewParams) -> StoreResult<ViewResponse> {
        self.inner.query_view(path, params)
    }

    fn query_ad_hoc(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse> {
        self.inner.query_ad_hoc(map, reduce, params)
    }
}

impl VersionSource for ConflictingStore {
    fn server_version(&self) -> StoreResult<String> {
        Ok("0.9.0".to_string())
    }
}

#[test]
fn test_conflict_propagates_unmodified() {
    let store = Arc::new(ConflictingStore {
        inner: MemoryStore::latest(),
        conflicts: AtomicU64::new(0),
    });
    let engine: ViewEngine<ConflictingStore> =
        ViewEngine::connect(Arc::clone(&store), student(), EngineConfig::default()).unwrap();

    let err = engine.count(QueryOptions::new().where_eq("grade", 11)).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.code(), "DOCVIEW_CONFLICT");
    assert_eq!(store.conflicts.load(Ordering::Relaxed), 1);
    assert!(engine.registry().known_views().unwrap().is_empty());
}

/// Delegates to a backing store that can be replaced, as when the database
/// is dropped and recreated underneath a running engine
struct ReplaceableStore {
    current: RwLock<Arc<MemoryStore>>,
}

impl ReplaceableStore {
    fn backing(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.current.read().unwrap())
    }

    fn replace(&self, store: Arc<MemoryStore>) {
        *self.current.write().unwrap() = store;
    }
}

impl DocumentStore for ReplaceableStore {
    fn get(&self, id: &str) -> StoreResult<Value> {
        self.backing().get(id)
    }

    fn save(&self, document: &Value) -> StoreResult<SaveReceipt> {
        self.backing().save(document)
    }

    fn query_view(&self, path: &ViewPath, params: &ViewParams) -> StoreResult<ViewResponse> {
        self.backing().query_view(path, params)
    }

    fn query_ad_hoc(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse> {
        self.backing().query_ad_hoc(map, reduce, params)
    }
}

impl VersionSource for ReplaceableStore {
    fn server_version(&self) -> StoreResult<String> {
        self.backing().server_version()
    }
}

#[test]
fn test_view_recreated_after_design_document_lost() {
    let store = Arc::new(ReplaceableStore {
        current: RwLock::new(seeded_store("0.9.0")),
    });
    let engine: ViewEngine<ReplaceableStore> =
        ViewEngine::connect(Arc::clone(&store), student(), EngineConfig::default()).unwrap();

    let before = engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    assert_eq!(ids(&before), vec!["s3", "s5"]);

    let fresh = seeded_store("0.9.0");
    store.replace(Arc::clone(&fresh));

    let after = engine.find(QueryOptions::new().where_eq("grade", 11)).unwrap();
    assert_eq!(ids(&after), vec!["s3", "s5"]);
    assert_eq!(view_names(&fresh), vec!["find_by_grade"]);
    assert_eq!(engine.metrics().design_documents_created, 2);
}
