//! Design document shape
//!
//! ```text
//! {
//!   "_id": "_design/<entity>",
//!   "_rev": "...",
//!   "views": { "<name>": { "map": "...", "reduce": "..." } }
//! }
//! ```
//!
//! Members this crate does not manage (`language`, validation functions, ...)
//! are carried through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compiler::ViewDefinition;

/// Map and reduce sources of one stored view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFunctions {
    pub map: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

impl From<&ViewDefinition> for ViewFunctions {
    fn from(view: &ViewDefinition) -> Self {
        Self {
            map: view.map.clone(),
            reduce: view.reduce.clone(),
        }
    }
}

/// One entity type's design document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default)]
    pub views: BTreeMap<String, ViewFunctions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DesignDocument {
    /// Creates an unsaved design document with no views
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: None,
            views: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// Adds the view unless one with that name exists. Returns true if added.
    pub fn add_view(&mut self, view: &ViewDefinition) -> bool {
        if self.has_view(&view.name) {
            return false;
        }
        self.views.insert(view.name.clone(), ViewFunctions::from(view));
        true
    }

    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }
}
