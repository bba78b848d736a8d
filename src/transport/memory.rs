//! In-memory document store
//!
//! Holds JSON documents with revision checking and answers view queries for
//! map functions of the synthesized shape:
//!
//! ```text
//! function(doc) { if(doc.<field> == '<value>') { emit([doc.a, doc.b], doc); } }
//! ```
//!
//! Reduce functions are assumed to count rows. Every operation is counted so
//! callers can assert how many round trips a query cost.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::capability::LATEST_STORE_VERSION;
use crate::collation::collate;

use super::errors::{StoreError, StoreResult};
use super::params::{ViewParams, ViewPath};
use super::response::{SaveReceipt, ViewResponse, ViewRow};
use super::{DocumentStore, VersionSource};

static DISCRIMINATOR_PATTERN: CompiledPattern =
    LazyLock::new(|| Regex::new(r"doc\.(\w+)\s*==\s*'([^']*)'"));
static EMIT_PATTERN: CompiledPattern =
    LazyLock::new(|| Regex::new(r"emit\(\s*\[([^\]]*)\]\s*,\s*doc\s*\)"));

/// Number of calls made per store operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSnapshot {
    pub gets: u64,
    pub saves: u64,
    pub view_queries: u64,
    pub ad_hoc_queries: u64,
}

#[derive(Debug, Default)]
struct CallCounters {
    gets: AtomicU64,
    saves: AtomicU64,
    view_queries: AtomicU64,
    ad_hoc_queries: AtomicU64,
}

impl CallCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            gets: self.gets.load(AtomicOrdering::Relaxed),
            saves: self.saves.load(AtomicOrdering::Relaxed),
            view_queries: self.view_queries.load(AtomicOrdering::Relaxed),
            ad_hoc_queries: self.ad_hoc_queries.load(AtomicOrdering::Relaxed),
        }
    }
}

/// What a synthesized map function selects and emits
#[derive(Debug, Clone, PartialEq)]
struct MapSpec {
    discriminator: Option<(String, String)>,
    key_fields: Vec<String>,
}

impl MapSpec {
    fn parse(source: &str) -> StoreResult<Self> {
        let discriminator_re = pattern(&DISCRIMINATOR_PATTERN)?;
        let emit_re = pattern(&EMIT_PATTERN)?;

        let discriminator = discriminator_re
            .captures(source)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()));

        let emitted = emit_re.captures(source).ok_or_else(|| {
            StoreError::Transport("map function does not emit a key array".into())
        })?;

        let key_fields = emitted[1]
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| f.strip_prefix("doc.").unwrap_or(f).to_string())
            .collect();

        Ok(Self {
            discriminator,
            key_fields,
        })
    }

    fn selects(&self, doc: &Value) -> bool {
        match &self.discriminator {
            Some((field, value)) => doc.get(field).and_then(Value::as_str) == Some(value),
            None => true,
        }
    }

    fn key_for(&self, doc: &Value) -> Value {
        Value::Array(
            self.key_fields
                .iter()
                .map(|f| doc.get(f).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}

type CompiledPattern = LazyLock<Result<Regex, regex::Error>>;

/// The compiled form of a map source pattern, built on first use
fn pattern(compiled: &'static CompiledPattern) -> StoreResult<&'static Regex> {
    compiled
        .as_ref()
        .map_err(|e| StoreError::Transport(e.to_string()))
}

/// In-process store implementing the transport contract
#[derive(Debug)]
pub struct MemoryStore {
    version: String,
    documents: RwLock<BTreeMap<String, Value>>,
    counters: CallCounters,
}

impl MemoryStore {
    /// Creates an empty store reporting the given version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            documents: RwLock::new(BTreeMap::new()),
            counters: CallCounters::default(),
        }
    }

    /// Creates an empty store reporting the newest known version
    pub fn latest() -> Self {
        Self::new(LATEST_STORE_VERSION.to_string())
    }

    /// Returns the call counts so far
    pub fn calls(&self) -> CallSnapshot {
        self.counters.snapshot()
    }

    /// Reads a document without counting a call
    pub fn peek(&self, id: &str) -> Option<Value> {
        self.read().ok().and_then(|docs| docs.get(id).cloned())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.documents
            .read()
            .map_err(|_| StoreError::Transport("document map lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, Value>>> {
        self.documents
            .write()
            .map_err(|_| StoreError::Transport("document map lock poisoned".into()))
    }

    /// Runs a map (and optional counting reduce) over every document
    fn evaluate(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse> {
        let spec = MapSpec::parse(map)?;
        if let Some(reduce) = reduce {
            if !reduce.contains("values.length") {
                return Err(StoreError::Transport(
                    "only counting reduce functions are supported".into(),
                ));
            }
        }

        let docs = self.read()?;
        let mut rows: Vec<ViewRow> = docs
            .iter()
            .filter(|(id, _)| !is_design(id))
            .filter(|(_, doc)| spec.selects(doc))
            .map(|(id, doc)| ViewRow::emitted(id.clone(), spec.key_for(doc), doc.clone()))
            .collect();
        drop(docs);

        let total_rows = rows.len() as u64;

        rows.sort_by(|a, b| collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id)));
        if params.descending {
            rows.reverse();
        }

        let mut rows = select_keys(rows, params);

        if reduce.is_some() && params.reduce != Some(false) {
            rows = if rows.is_empty() {
                Vec::new()
            } else {
                vec![ViewRow::reduced(Value::Null, json!(rows.len()))]
            };
        }

        let skip = params.skip.unwrap_or(0);
        let rows: Vec<ViewRow> = rows
            .into_iter()
            .skip(skip as usize)
            .take(params.limit_value().map(|n| n as usize).unwrap_or(usize::MAX))
            .collect();

        Ok(ViewResponse {
            total_rows: Some(total_rows),
            offset: Some(skip),
            rows,
        })
    }
}

fn is_design(id: &str) -> bool {
    id.starts_with("_design/")
}

/// Applies `keys`, `key` and the start/end range to ordered rows
fn select_keys(rows: Vec<ViewRow>, params: &ViewParams) -> Vec<ViewRow> {
    use std::cmp::Ordering;

    if let Some(keys) = &params.keys {
        let rows = &rows;
        return keys
            .iter()
            .flat_map(|k| {
                rows.iter()
                    .filter(move |row| collate(&row.key, k) == Ordering::Equal)
                    .cloned()
            })
            .collect();
    }

    if let Some(key) = &params.key {
        return rows
            .into_iter()
            .filter(|row| collate(&row.key, key) == Ordering::Equal)
            .collect();
    }

    // Bounds are in traversal order: descending walks from high to low.
    let after_start = |row: &ViewRow| match &params.start_key {
        Some(start) if params.descending => collate(&row.key, start) != Ordering::Greater,
        Some(start) => collate(&row.key, start) != Ordering::Less,
        None => true,
    };
    let before_end = |row: &ViewRow| match &params.end_key {
        Some(end) if params.descending => collate(&row.key, end) != Ordering::Less,
        Some(end) => collate(&row.key, end) != Ordering::Greater,
        None => true,
    };

    rows.into_iter()
        .filter(|row| after_start(row) && before_end(row))
        .collect()
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> StoreResult<Value> {
        CallCounters::bump(&self.counters.gets);
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("document '{}'", id)))
    }

    fn save(&self, document: &Value) -> StoreResult<SaveReceipt> {
        CallCounters::bump(&self.counters.saves);

        let mut doc = match document {
            Value::Object(map) => map.clone(),
            _ => return Err(StoreError::Transport("document must be a JSON object".into())),
        };

        let id = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        let given_rev = doc.get("_rev").and_then(Value::as_str).map(str::to_string);

        let mut docs = self.write()?;
        let current_rev = docs
            .get(&id)
            .and_then(|d| d.get("_rev"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if given_rev != current_rev {
            return Err(StoreError::Conflict(format!(
                "document '{}' revision mismatch",
                id
            )));
        }

        let generation = current_rev
            .as_deref()
            .and_then(|rev| rev.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let rev = format!("{}-{}", generation, Uuid::new_v4().simple());

        doc.insert("_id".into(), Value::String(id.clone()));
        doc.insert("_rev".into(), Value::String(rev.clone()));
        docs.insert(id.clone(), Value::Object(doc));

        Ok(SaveReceipt { id, rev })
    }

    fn query_view(&self, path: &ViewPath, params: &ViewParams) -> StoreResult<ViewResponse> {
        CallCounters::bump(&self.counters.view_queries);

        let (map, reduce) = {
            let docs = self.read()?;
            let design = docs
                .get(&path.design_id())
                .ok_or_else(|| StoreError::NotFound(format!("design document '{}'", path.design)))?;
            let view = design
                .get("views")
                .and_then(|views| views.get(&path.view))
                .ok_or_else(|| StoreError::NotFound(format!("view '{}'", path)))?;

            let map = view
                .get("map")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Transport(format!("view '{}' has no map", path)))?
                .to_string();
            let reduce = view.get("reduce").and_then(Value::as_str).map(str::to_string);
            (map, reduce)
        };

        self.evaluate(&map, reduce.as_deref(), params)
    }

    fn query_ad_hoc(
        &self,
        map: &str,
        reduce: Option<&str>,
        params: &ViewParams,
    ) -> StoreResult<ViewResponse> {
        CallCounters::bump(&self.counters.ad_hoc_queries);
        self.evaluate(map, reduce, params)
    }
}

impl VersionSource for MemoryStore {
    fn server_version(&self) -> StoreResult<String> {
        Ok(self.version.clone())
    }
}
