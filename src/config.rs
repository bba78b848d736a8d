//! Engine configuration
//!
//! Every member has a default, so `{}` is a complete configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid engine configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid engine configuration: {0}")]
    InvalidLogLevel(String),

    #[error("Failed to read configuration '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "DOCVIEW_INVALID_CONFIG"
    }
}

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Document field holding the entity type (default: "doc_type")
    #[serde(default = "default_discriminator_field")]
    pub discriminator_field: String,

    /// Store version to assume instead of asking the store
    #[serde(default)]
    pub store_version: Option<String>,

    /// Refresh indexes before answering (default: true). When false every
    /// query is served from the index as it stands.
    #[serde(default = "default_update_index")]
    pub update_index: bool,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_discriminator_field() -> String {
    "doc_type".to_string()
}

fn default_update_index() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discriminator_field: default_discriminator_field(),
            store_version: None,
            update_index: default_update_index(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(input)?;
        config.severity()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Assumes the given store version instead of asking the store
    pub fn with_store_version(mut self, version: impl Into<String>) -> Self {
        self.store_version = Some(version.into());
        self
    }

    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> Result<Severity, ConfigError> {
        self.log_level
            .parse::<Severity>()
            .map_err(ConfigError::InvalidLogLevel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.discriminator_field, "doc_type");
        assert_eq!(config.store_version, None);
        assert!(config.update_index);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_from_json() {
        let input = r#"{
            "discriminator_field": "type",
            "store_version": "0.8.1",
            "update_index": false,
            "log_level": "warn"
        }"#;
        let config = EngineConfig::from_json(input).unwrap();
        assert_eq!(config.discriminator_field, "type");
        assert_eq!(config.store_version.as_deref(), Some("0.8.1"));
        assert!(!config.update_index);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_rejects_unknown_members_and_levels() {
        assert!(EngineConfig::from_json(r#"{"discriminator": "type"}"#).is_err());

        let err = EngineConfig::from_json(r#"{"log_level": "chatty"}"#).unwrap_err();
        assert_eq!(err.code(), "DOCVIEW_INVALID_CONFIG");
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docview.json");
        fs::write(&path, r#"{"store_version": "0.8.0"}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.store_version.as_deref(), Some("0.8.0"));
        assert_eq!(config.discriminator_field, "doc_type");

        let err = EngineConfig::from_file(temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "DOCVIEW_INVALID_CONFIG");
        assert!(err.to_string().contains("absent.json"));
    }
}
