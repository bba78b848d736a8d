//! Search field selection
//!
//! Selection order:
//! 1. explicit `use_key` fields
//! 2. condition fields
//! 3. the creation timestamp if declared, else the identity field
//!
//! Names are normalized before sorting so the key fields and the condition
//! values line up position by position.

use std::collections::BTreeMap;

use super::entity::EntityDescriptor;
use super::options::{Condition, QueryOptions};

/// Store-internal identity field
pub const ID_FIELD: &str = "_id";
/// Store-internal revision field
pub const REV_FIELD: &str = "_rev";

/// Maps identity/revision aliases onto the store's internal names
pub fn normalize_field(name: &str) -> &str {
    match name {
        "id" => ID_FIELD,
        "rev" => REV_FIELD,
        other => other,
    }
}

/// Conditions keyed by normalized field name, sorted by field.
///
/// When an alias and its internal name are both given (`id` and `_id`), the
/// condition on the internal name wins, so each key field carries exactly
/// one value.
pub fn normalized_conditions(options: &QueryOptions) -> Vec<(String, Condition)> {
    let mut merged: BTreeMap<String, Condition> = BTreeMap::new();
    for (field, condition) in &options.conditions {
        let name = normalize_field(field);
        if name == field.as_str() || !merged.contains_key(name) {
            merged.insert(name.to_string(), condition.clone());
        }
    }
    merged.into_iter().collect()
}

/// Key fields plus the condition values to encode against them
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    /// Emitted key fields, sorted and unique
    pub key_fields: Vec<String>,
    /// Conditions as (normalized field, condition), sorted by field
    pub conditions: Vec<(String, Condition)>,
}

impl SearchSpec {
    /// Derives the search spec for a query against an entity
    pub fn derive(options: &QueryOptions, entity: &EntityDescriptor) -> Self {
        let conditions = normalized_conditions(options);

        let mut key_fields: Vec<String> = match &options.use_key {
            Some(fields) => fields
                .iter()
                .map(|f| normalize_field(f).to_string())
                .collect(),
            None => conditions.iter().map(|(f, _)| f.clone()).collect(),
        };
        key_fields.sort();
        key_fields.dedup();

        if key_fields.is_empty() {
            let fallback = entity.created_at().unwrap_or(ID_FIELD);
            key_fields.push(fallback.to_string());
        }

        Self {
            key_fields,
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_fields_sorted() {
        let entity = EntityDescriptor::new("Person");
        let options = QueryOptions::new()
            .where_eq("zip", "90210")
            .where_eq("age", 30);

        let spec = SearchSpec::derive(&options, &entity);
        assert_eq!(spec.key_fields, vec!["age", "zip"]);
        assert_eq!(spec.conditions[0].0, "age");
        assert_eq!(spec.conditions[1].1, Condition::Exact(json!("90210")));
    }

    #[test]
    fn test_use_key_overrides_conditions() {
        let entity = EntityDescriptor::new("Person");
        let options = QueryOptions::new()
            .use_key(["name", "administrator"])
            .where_eq("administrator", true);

        let spec = SearchSpec::derive(&options, &entity);
        assert_eq!(spec.key_fields, vec!["administrator", "name"]);
        assert_eq!(spec.conditions.len(), 1);
    }

    #[test]
    fn test_fallback_created_at_then_id() {
        let plain = EntityDescriptor::new("Person");
        let spec = SearchSpec::derive(&QueryOptions::new(), &plain);
        assert_eq!(spec.key_fields, vec![ID_FIELD]);

        let stamped = EntityDescriptor::new("Person").with_created_at("created_at");
        let spec = SearchSpec::derive(&QueryOptions::new(), &stamped);
        assert_eq!(spec.key_fields, vec!["created_at"]);
    }

    #[test]
    fn test_alias_normalization() {
        let entity = EntityDescriptor::new("Person");
        let options = QueryOptions::new()
            .where_eq("id", "abc")
            .where_eq("name", "bob")
            .where_eq("rev", "1-x");

        let spec = SearchSpec::derive(&options, &entity);
        assert_eq!(spec.key_fields, vec!["_id", "_rev", "name"]);
        let values: Vec<_> = spec.conditions.iter().map(|(_, c)| c.clone()).collect();
        assert_eq!(
            values,
            vec![
                Condition::Exact(json!("abc")),
                Condition::Exact(json!("1-x")),
                Condition::Exact(json!("bob")),
            ]
        );
    }

    #[test]
    fn test_use_key_deduplicated() {
        let entity = EntityDescriptor::new("Person");
        let options = QueryOptions::new().use_key(["id", "_id", "name"]);
        let spec = SearchSpec::derive(&options, &entity);
        assert_eq!(spec.key_fields, vec!["_id", "name"]);
    }

    #[test]
    fn test_alias_and_internal_name_collapse() {
        let entity = EntityDescriptor::new("Person");
        let options = QueryOptions::new()
            .where_eq("id", "alias")
            .where_eq("_id", "internal");

        let spec = SearchSpec::derive(&options, &entity);
        assert_eq!(spec.key_fields, vec!["_id"]);
        assert_eq!(
            spec.conditions,
            vec![("_id".to_string(), Condition::Exact(json!("internal")))]
        );

        let alias_only = QueryOptions::new().where_eq("id", "alias");
        assert_eq!(
            normalized_conditions(&alias_only),
            vec![("_id".to_string(), Condition::Exact(json!("alias")))]
        );
    }
}
