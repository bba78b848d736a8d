//! Row-to-result conversion
//!
//! Ordering is applied in memory after retrieval, so it only ever reorders
//! the rows the store returned. Combined with a limit it can therefore pick a
//! different set than a store-side sort would.

use std::cmp;

use serde_json::Value;

use crate::collation::collate_optional;
use crate::compiler::{EntityDescriptor, QueryOptions};
use crate::transport::{ViewResponse, ViewRow};

use super::document::Materialize;
use super::errors::{MaterializeError, MaterializeResult};

/// Result of a custom view query
#[derive(Debug, Clone)]
pub enum QueryOutput<T> {
    Documents(Vec<T>),
    Raw(Vec<ViewRow>),
}

impl<T> QueryOutput<T> {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Documents(docs) => docs.len(),
            QueryOutput::Raw(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn documents(self) -> Option<Vec<T>> {
        match self {
            QueryOutput::Documents(docs) => Some(docs),
            QueryOutput::Raw(_) => None,
        }
    }

    pub fn rows(self) -> Option<Vec<ViewRow>> {
        match self {
            QueryOutput::Raw(rows) => Some(rows),
            QueryOutput::Documents(_) => None,
        }
    }
}

/// Converts view rows into results for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMaterializer {
    raw: bool,
    readonly: bool,
    order: Option<String>,
}

impl ResultMaterializer {
    /// Takes the flags and ordering of a query. The query's own ordering
    /// field wins over the entity's default.
    pub fn for_query(options: &QueryOptions, entity: &EntityDescriptor) -> Self {
        Self {
            raw: options.raw,
            readonly: options.readonly,
            order: options
                .order
                .clone()
                .or_else(|| entity.default_sort().map(str::to_string)),
        }
    }

    pub fn order(&self) -> Option<&str> {
        self.order.as_deref()
    }

    /// Builds one domain object from a fetched document
    pub fn document<T: Materialize>(&self, document: Value) -> MaterializeResult<T> {
        let mut doc = T::from_document(document)?;
        if self.readonly {
            doc.set_readonly();
        }
        Ok(doc)
    }

    /// Builds domain objects from row values
    pub fn documents<T: Materialize>(&self, rows: Vec<ViewRow>) -> MaterializeResult<Vec<T>> {
        let mut documents = rows
            .into_iter()
            .map(|row| self.document(row.value))
            .collect::<MaterializeResult<Vec<T>>>()?;

        if let Some(field) = &self.order {
            // Stable: equal keys keep store order.
            documents.sort_by(|a, b| collate_optional(a.field(field), b.field(field)));
        }

        Ok(documents)
    }

    /// Rows untouched when raw output was requested, documents otherwise
    pub fn output<T: Materialize>(&self, rows: Vec<ViewRow>) -> MaterializeResult<QueryOutput<T>> {
        if self.raw {
            return Ok(QueryOutput::Raw(rows));
        }
        self.documents(rows).map(QueryOutput::Documents)
    }
}

/// Reads a count from a view response.
///
/// Reduced responses carry the count in the first row (no rows means 0);
/// otherwise every row is one match.
pub fn extract_count(response: &ViewResponse, reduce_counted: bool) -> MaterializeResult<u64> {
    if !reduce_counted {
        return Ok(response.rows.len() as u64);
    }

    match response.rows.first() {
        None => Ok(0),
        Some(row) => count_value(&row.value),
    }
}

fn count_value(value: &Value) -> MaterializeResult<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    // Some stores reduce to floats.
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(MaterializeError::BadCount(value.clone())),
    }
}

/// Applies a limit/offset scope to a total count: `min(L, max(N - O, 0))`
pub fn cap_count(total: u64, limit: Option<u64>, offset: Option<u64>) -> u64 {
    let remaining = total.saturating_sub(offset.unwrap_or(0));
    match limit {
        Some(limit) => cmp::min(limit, remaining),
        None => remaining,
    }
}
