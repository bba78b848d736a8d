//! View query parameters as the store understands them
//!
//! Keys are JSON encoded. `keys` travels in a request body rather than the
//! query string, so it is kept apart from the other pairs.

use std::fmt;

use serde_json::{json, Value};

use crate::capability::LimitParam;

/// Identifies a view inside a design document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewPath {
    /// Design document name, without the `_design/` prefix
    pub design: String,
    /// View name inside the design document
    pub view: String,
}

impl ViewPath {
    pub fn new(design: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design: design.into(),
            view: view.into(),
        }
    }

    /// Returns the design document id (`_design/<design>`)
    pub fn design_id(&self) -> String {
        format!("_design/{}", self.design)
    }
}

impl fmt::Display for ViewPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.design, self.view)
    }
}

/// Encoded parameters of one view request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams {
    /// Exact composite key
    pub key: Option<Value>,
    /// Several exact composite keys, answered in the given order
    pub keys: Option<Vec<Value>>,
    pub start_key: Option<Value>,
    pub end_key: Option<Value>,
    pub descending: bool,
    /// Rows skipped before the limit applies
    pub skip: Option<u64>,
    /// Row limit and the name the store expects it under
    pub limit: Option<(LimitParam, u64)>,
    /// Explicit reduce toggle
    pub reduce: Option<bool>,
    /// Serve from the index without refreshing it first
    pub stale: bool,
}

impl ViewParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limit regardless of the parameter name
    pub fn limit_value(&self) -> Option<u64> {
        self.limit.map(|(_, n)| n)
    }

    /// Query string pairs with JSON-encoded values, in a stable order.
    ///
    /// `keys` is not included; see [`ViewParams::body`].
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(key) = &self.key {
            pairs.push(("key", key.to_string()));
        }
        if let Some(start) = &self.start_key {
            pairs.push(("startkey", start.to_string()));
        }
        if let Some(end) = &self.end_key {
            pairs.push(("endkey", end.to_string()));
        }
        if self.descending {
            pairs.push(("descending", "true".to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some((param, n)) = self.limit {
            pairs.push((param.as_str(), n.to_string()));
        }
        if let Some(reduce) = self.reduce {
            pairs.push(("reduce", reduce.to_string()));
        }
        if self.stale {
            pairs.push(("stale", "ok".to_string()));
        }

        pairs
    }

    /// Request body carrying `keys`, if any
    pub fn body(&self) -> Option<Value> {
        self.keys.as_ref().map(|keys| json!({ "keys": keys }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_path() {
        let path = ViewPath::new("person", "find_by_name");
        assert_eq!(path.to_string(), "person/find_by_name");
        assert_eq!(path.design_id(), "_design/person");
    }

    #[test]
    fn test_query_pairs_encoding() {
        let params = ViewParams {
            start_key: Some(json!([20])),
            end_key: Some(json!([30])),
            skip: Some(5),
            limit: Some((LimitParam::Count, 10)),
            stale: true,
            ..ViewParams::default()
        };

        let pairs = params.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("startkey", "[20]".to_string()),
                ("endkey", "[30]".to_string()),
                ("skip", "5".to_string()),
                ("count", "10".to_string()),
                ("stale", "ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_keys_go_to_body() {
        let params = ViewParams {
            keys: Some(vec![json!([9]), json!([11])]),
            ..ViewParams::default()
        };
        assert!(params.query_pairs().is_empty());
        assert_eq!(params.body(), Some(json!({"keys": [[9], [11]]})));
    }
}
