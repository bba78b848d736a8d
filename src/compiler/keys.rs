//! Key encoding
//!
//! Views match documents only by composite key: one exact key, a contiguous
//! key range, or a list of exact keys. Conditions are encoded into exactly
//! one of those shapes, in sorted field order.

use serde_json::Value;

use super::options::Condition;

/// Encoded key selection for one query
#[derive(Debug, Clone, PartialEq)]
pub enum KeyEncoding {
    /// No conditions: the whole view
    Unbounded,
    /// One exact composite key
    Exact(Value),
    /// Composite keys between `start` and `end`, in ascending terms
    Range { start: Value, end: Value },
    /// Several exact composite keys, in request order
    Multi(Vec<Value>),
}

impl KeyEncoding {
    /// Encodes sorted conditions.
    ///
    /// Precedence: any range produces a start/end pair (non-range values are
    /// repeated on both ends); otherwise any discrete set expands into one key
    /// per combination; otherwise all values form one exact key.
    pub fn encode(conditions: &[(String, Condition)]) -> Self {
        if conditions.is_empty() {
            return KeyEncoding::Unbounded;
        }

        if conditions.iter().any(|(_, c)| c.is_range()) {
            let start = conditions
                .iter()
                .map(|(_, c)| match c {
                    Condition::Range { start, .. } => start.clone(),
                    other => plain_value(other),
                })
                .collect();
            let end = conditions
                .iter()
                .map(|(_, c)| match c {
                    Condition::Range { end, .. } => end.clone(),
                    other => plain_value(other),
                })
                .collect();
            return KeyEncoding::Range {
                start: Value::Array(start),
                end: Value::Array(end),
            };
        }

        if conditions.iter().any(|(_, c)| c.is_any_of()) {
            return KeyEncoding::Multi(expand(conditions));
        }

        KeyEncoding::Exact(Value::Array(
            conditions.iter().map(|(_, c)| plain_value(c)).collect(),
        ))
    }
}

/// Value used for a non-range condition inside a range key.
///
/// A discrete set cannot be expressed inside a range and is passed through
/// as its array.
fn plain_value(condition: &Condition) -> Value {
    match condition {
        Condition::Exact(v) => v.clone(),
        Condition::AnyOf(values) => Value::Array(values.clone()),
        Condition::Range { start, .. } => start.clone(),
    }
}

/// One key per combination of set members, earlier fields varying slowest
fn expand(conditions: &[(String, Condition)]) -> Vec<Value> {
    let mut keys: Vec<Vec<Value>> = vec![Vec::new()];

    for (_, condition) in conditions {
        keys = match condition {
            Condition::AnyOf(members) => keys
                .iter()
                .flat_map(|prefix| {
                    members.iter().map(move |m| {
                        let mut key = prefix.clone();
                        key.push(m.clone());
                        key
                    })
                })
                .collect(),
            other => {
                let value = plain_value(other);
                keys.into_iter()
                    .map(|mut key| {
                        key.push(value.clone());
                        key
                    })
                    .collect()
            }
        };
    }

    keys.into_iter().map(Value::Array).collect()
}

/// Wraps a scalar key into a one-element array; arrays pass through
pub fn as_key_array(key: Value) -> Value {
    match key {
        Value::Array(_) => key,
        other => Value::Array(vec![other]),
    }
}
