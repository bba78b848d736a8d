//! Wire shapes returned by the store

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single view row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Source document id (absent on reduced rows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Emitted key
    #[serde(default)]
    pub key: Value,
    /// Emitted value, or the reduced value
    #[serde(default)]
    pub value: Value,
}

impl ViewRow {
    /// Creates a row emitted for a document
    pub fn emitted(id: impl Into<String>, key: Value, value: Value) -> Self {
        Self {
            id: Some(id.into()),
            key,
            value,
        }
    }

    /// Creates a reduced row
    pub fn reduced(key: Value, value: Value) -> Self {
        Self {
            id: None,
            key,
            value,
        }
    }
}

/// Result of a view or ad-hoc query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

impl ViewResponse {
    /// Creates a response holding the given rows
    pub fn from_rows(rows: Vec<ViewRow>) -> Self {
        Self {
            total_rows: None,
            offset: None,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Acknowledgement of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub id: String,
    pub rev: String,
}
