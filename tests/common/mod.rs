//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use docview::materializer::Document;
use docview::{DocumentStore, EngineConfig, EntityDescriptor, MemoryStore, ViewEngine};
use serde_json::json;

pub const STUDENT_MAP_BY_AGE: &str =
    "function(doc) {\n  if(doc.doc_type == 'Student') {\n    emit([doc.age], doc);\n  }\n}";
pub const COUNTING_REDUCE: &str = "function(keys, values) {\n  return values.length;\n}";

/// Five students and one pet. Ages 14..17, grades 9..12 with two in grade 11.
pub fn seeded_store(version: &str) -> Arc<MemoryStore> {
    let store = MemoryStore::new(version);
    let students = [
        ("s1", "Ada", 9, 14, "2009/01/05"),
        ("s2", "Ben", 10, 15, "2009/02/11"),
        ("s3", "Cy", 11, 16, "2009/03/02"),
        ("s4", "Dee", 12, 17, "2009/04/20"),
        ("s5", "Eve", 11, 16, "2009/05/09"),
    ];
    for (id, name, grade, age, created_at) in students {
        let doc = json!({
            "_id": id,
            "doc_type": "Student",
            "name": name,
            "grade": grade,
            "age": age,
            "created_at": created_at,
        });
        store.save(&doc).unwrap();
    }
    store
        .save(&json!({
            "_id": "p1",
            "doc_type": "Pet",
            "name": "Rex",
            "grade": 11,
            "age": 3,
            "created_at": "2009/01/01",
        }))
        .unwrap();
    Arc::new(store)
}

pub fn student() -> EntityDescriptor {
    EntityDescriptor::new("Student").with_created_at("created_at")
}

pub fn engine(store: &Arc<MemoryStore>) -> ViewEngine<MemoryStore> {
    ViewEngine::connect(Arc::clone(store), student(), EngineConfig::default()).unwrap()
}

pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|d| d.id().unwrap_or_default().to_string())
        .collect()
}
