//! Query options supplied by callers
//!
//! Conditions are keyed by field name and are always combined with AND.
//! A condition is an exact value, a two-ended range, or a discrete set.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::collation::collate;

/// A condition on one field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// field = value
    Exact(Value),
    /// start <= field <= end (bounds are not validated)
    Range { start: Value, end: Value },
    /// field is any of the values, in the given order
    AnyOf(Vec<Value>),
}

impl Condition {
    pub fn range(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Condition::Range {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::AnyOf(values.into_iter().map(Into::into).collect())
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Condition::Range { .. })
    }

    pub fn is_any_of(&self) -> bool {
        matches!(self, Condition::AnyOf(_))
    }

    /// Checks a document value in memory, with view key collation.
    /// A missing field compares as null.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let value = value.unwrap_or(&Value::Null);
        match self {
            Condition::Exact(expected) => collate(value, expected) == Ordering::Equal,
            Condition::Range { start, end } => {
                collate(value, start) != Ordering::Less && collate(value, end) != Ordering::Greater
            }
            Condition::AnyOf(members) => members
                .iter()
                .any(|m| collate(value, m) == Ordering::Equal),
        }
    }

    /// Returns the operation name for log output
    pub fn op_name(&self) -> &'static str {
        match self {
            Condition::Exact(_) => "eq",
            Condition::Range { .. } => "range",
            Condition::AnyOf(_) => "any",
        }
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Exact(value)
    }
}

/// Options bag accepted by every query entry point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Field conditions
    pub conditions: BTreeMap<String, Condition>,
    /// Explicit key fields, overriding the condition fields
    pub use_key: Option<Vec<String>>,
    /// Field to sort materialized results by
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Traverse the view backwards
    pub descending: bool,
    /// Mark materialized documents read-only
    pub readonly: bool,
    /// Return the raw rows instead of documents
    pub raw: bool,
    /// Serve from the index as it is, without refreshing it
    pub skip_index_update: bool,
    /// Evaluate the map/reduce pair directly instead of through a stored view
    pub ad_hoc: bool,
    /// Explicit start key (wins over condition encoding)
    pub start_key: Option<Value>,
    /// Explicit end key (wins over condition encoding)
    pub end_key: Option<Value>,
    /// Explicit exact keys (wins over condition encoding)
    pub keys: Option<Vec<Value>>,
    /// Explicit reduce toggle, for custom views carrying a reduce function
    pub reduce: Option<bool>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition
    pub fn with_condition(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// Adds an equality condition
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_condition(field, Condition::Exact(value.into()))
    }

    /// Adds an inclusive range condition
    pub fn where_range(
        self,
        field: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.with_condition(field, Condition::range(start, end))
    }

    /// Adds a discrete set condition
    pub fn where_any<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_condition(field, Condition::any_of(values))
    }

    /// Sets the key fields explicitly
    pub fn use_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_key = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order = Some(field.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn without_index_update(mut self) -> Self {
        self.skip_index_update = true;
        self
    }

    pub fn ad_hoc(mut self) -> Self {
        self.ad_hoc = true;
        self
    }

    pub fn with_start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    pub fn with_end_key(mut self, key: impl Into<Value>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    pub fn with_keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_reduce(mut self, reduce: bool) -> Self {
        self.reduce = Some(reduce);
        self
    }

    /// Layers these options over `defaults`.
    ///
    /// Set values win; flags are combined; conditions are merged with ours
    /// replacing same-named defaults.
    pub fn over(self, defaults: &QueryOptions) -> QueryOptions {
        let mut conditions = defaults.conditions.clone();
        conditions.extend(self.conditions);

        QueryOptions {
            conditions,
            use_key: self.use_key.or_else(|| defaults.use_key.clone()),
            order: self.order.or_else(|| defaults.order.clone()),
            limit: self.limit.or(defaults.limit),
            offset: self.offset.or(defaults.offset),
            descending: self.descending || defaults.descending,
            readonly: self.readonly || defaults.readonly,
            raw: self.raw || defaults.raw,
            skip_index_update: self.skip_index_update || defaults.skip_index_update,
            ad_hoc: self.ad_hoc || defaults.ad_hoc,
            start_key: self.start_key.or_else(|| defaults.start_key.clone()),
            end_key: self.end_key.or_else(|| defaults.end_key.clone()),
            keys: self.keys.or_else(|| defaults.keys.clone()),
            reduce: self.reduce.or(defaults.reduce),
        }
    }
}
