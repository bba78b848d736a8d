//! View definitions and naming

use std::fmt;

/// Operation a generated view name is prefixed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPrefix {
    Find,
    /// Only used when counting cannot share the finder's view
    Count,
}

impl ViewPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewPrefix::Find => "find",
            ViewPrefix::Count => "count",
        }
    }
}

/// Deterministic view name: `<prefix>_by_<f1>_and_<f2>...`
///
/// `fields` must already be sorted.
pub fn view_name(prefix: ViewPrefix, fields: &[String]) -> String {
    format!("{}_by_{}", prefix.as_str(), fields.join("_and_"))
}

/// A named view: map source and optional reduce source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewDefinition {
    pub name: String,
    pub map: String,
    pub reduce: Option<String>,
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, map: impl Into<String>, reduce: Option<String>) -> Self {
        Self {
            name: name.into(),
            map: map.into(),
            reduce,
        }
    }

    pub fn has_reduce(&self) -> bool {
        self.reduce.is_some()
    }
}

impl fmt::Display for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_name() {
        let fields = vec!["age".to_string(), "name".to_string()];
        assert_eq!(view_name(ViewPrefix::Find, &fields), "find_by_age_and_name");
        assert_eq!(view_name(ViewPrefix::Count, &fields[..1]), "count_by_age");
    }
}
