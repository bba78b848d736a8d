//! Domain objects built from view rows

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::compiler::{ID_FIELD, REV_FIELD};

use super::errors::{MaterializeError, MaterializeResult};

/// A type view rows can be materialized into
pub trait Materialize: Sized {
    /// Builds the object from a row's document value
    fn from_document(document: Value) -> MaterializeResult<Self>;

    /// Marks the object read-only
    fn set_readonly(&mut self);

    /// Looks up a top-level field, for ordering
    fn field(&self, name: &str) -> Option<&Value>;
}

fn document_id(document: &Value) -> String {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string()
}

/// Untyped document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    body: Map<String, Value>,
    readonly: bool,
}

impl Document {
    pub fn new(body: Map<String, Value>) -> Self {
        Self {
            body,
            readonly: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.body.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn rev(&self) -> Option<&str> {
        self.body.get(REV_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }
}

impl Materialize for Document {
    fn from_document(document: Value) -> MaterializeResult<Self> {
        match document {
            Value::Object(body) => Ok(Document::new(body)),
            other => Err(MaterializeError::NotADocument {
                id: document_id(&other),
            }),
        }
    }

    fn set_readonly(&mut self) {
        self.readonly = true;
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id().unwrap_or("<unsaved>"))
    }
}

/// A strongly typed record that keeps its source document for ordering
#[derive(Debug, Clone)]
pub struct Typed<T> {
    pub record: T,
    source: Value,
    readonly: bool,
}

impl<T> Typed<T> {
    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}

impl<T: DeserializeOwned> Materialize for Typed<T> {
    fn from_document(document: Value) -> MaterializeResult<Self> {
        if !document.is_object() {
            return Err(MaterializeError::NotADocument {
                id: document_id(&document),
            });
        }
        let record = T::deserialize(&document).map_err(|source| MaterializeError::Decode {
            id: document_id(&document),
            source,
        })?;
        Ok(Self {
            record,
            source: document,
            readonly: false,
        })
    }

    fn set_readonly(&mut self) {
        self.readonly = true;
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.source.get(name)
    }
}
