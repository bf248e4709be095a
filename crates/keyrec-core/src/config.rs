//! Job configuration files
//!
//! A job file is JSON holding the caller-side settings for reshaping and
//! reconciling: key mapping, defaults, fallback, projection mode and
//! composite key. Every field is optional.

use crate::error::{Error, Result};
use crate::mapping::KeyMapping;
use crate::projector::ProjectionMode;
use crate::record::DefaultMap;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one reshape / reconcile job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// `[old, new]` field name pairs; empty means identity
    pub mapping: KeyMapping,
    /// Per-field defaults, keyed by new field name
    pub defaults: DefaultMap,
    /// Value used when neither the source nor `defaults` has a field
    pub fallback: Value,
    /// Projection applied by the `project` command
    pub mode: ProjectionMode,
    /// Fields identifying the same entity across snapshots
    pub composite_key: Vec<String>,
    /// Turn numeric CSV cells into numbers
    pub infer_types: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            mapping: KeyMapping::identity(),
            defaults: DefaultMap::new(),
            fallback: Value::String(String::new()),
            mode: ProjectionMode::New,
            composite_key: Vec::new(),
            infer_types: false,
        }
    }
}

impl JobConfig {
    /// Load a job file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the job file as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// An example job showing every setting
    pub fn template() -> Self {
        let mut defaults = DefaultMap::new();
        defaults.insert("status".to_string(), Value::String("active".to_string()));
        Self {
            mapping: KeyMapping::from_pairs(vec![("Id", "id"), ("Name", "name"), ("Status", "status")]),
            defaults,
            composite_key: vec!["id".to_string()],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_json_is_default() {
        let config: JobConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, JobConfig::default());
        assert!(config.mapping.is_identity());
        assert_eq!(config.fallback, json!(""));
    }

    #[test]
    fn test_parse_full_job() {
        let text = r#"{
            "mapping": [["h1", "_h1"], ["h3", "_h3"]],
            "defaults": {"_h3": 0},
            "fallback": null,
            "mode": "update",
            "composite_key": ["_h1"],
            "infer_types": true
        }"#;
        let config: JobConfig = serde_json::from_str(text).unwrap();
        assert_eq!(config.mapping.new_keys(), ["_h1", "_h3"]);
        assert_eq!(config.defaults.get("_h3"), Some(&json!(0)));
        assert_eq!(config.fallback, Value::Null);
        assert_eq!(config.mode, ProjectionMode::Update);
        assert_eq!(config.composite_key, vec!["_h1"]);
        assert!(config.infer_types);
    }

    #[test]
    fn test_mode_is_case_insensitive() {
        let config: JobConfig = serde_json::from_str(r#"{"mode": "Update"}"#).unwrap();
        assert_eq!(config.mode, ProjectionMode::Update);
        let config: JobConfig = serde_json::from_str(r#"{"mode": "RENAME"}"#).unwrap();
        assert_eq!(config.mode, ProjectionMode::Rename);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result: std::result::Result<JobConfig, _> = serde_json::from_str(r#"{"mode": "merge"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");

        let config = JobConfig::template();
        config.save(&path).unwrap();
        let loaded = JobConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = JobConfig::load("/nonexistent/job.json").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
