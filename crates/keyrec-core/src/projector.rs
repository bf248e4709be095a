//! Key projection: rename, filter and default the fields of a single record
//!
//! All three projections share one resolution rule. For a target field
//! `new_key` sourced from `old_key`, the value is `record[old_key]` if the
//! record has that field, else `defaults[new_key]`, else the fallback. They
//! differ only in which source keys they walk:
//!
//! - [`ProjectionMode::New`]: the mapping's old keys, nothing else
//! - [`ProjectionMode::Rename`]: the record's own keys
//! - [`ProjectionMode::Update`]: the record's keys, then the defaults' keys
//!   the record lacks

use crate::error::{Error, Result};
use crate::mapping::KeyMapping;
use crate::record::{DefaultMap, Record};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which field set a projection produces
///
/// Parsed case-insensitively, from job files as well as the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionMode {
    /// Exactly the mapping's new keys
    #[default]
    New,
    /// The record's keys, renamed where the mapping says so
    Rename,
    /// Rename, plus any default-only fields
    Update,
}

impl FromStr for ProjectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "rename" => Ok(Self::Rename),
            "update" => Ok(Self::Update),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProjectionMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ProjectionMode> for String {
    fn from(mode: ProjectionMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Rename => "rename",
            Self::Update => "update",
        };
        f.write_str(s)
    }
}

/// Build a record holding exactly the mapping's new keys, in mapping order
///
/// Fields of `record` that the mapping does not name are dropped. With an
/// identity mapping the result is empty.
pub fn project_new(
    record: &Record,
    mapping: &KeyMapping,
    defaults: &DefaultMap,
    fallback: &Value,
) -> Record {
    let mut out = Record::new();
    for (old_key, new_key) in mapping.pairs() {
        let value = resolve(record, old_key, new_key, defaults, fallback);
        out.insert(new_key.to_string(), value);
    }
    out
}

/// Rename the fields of `record` that the mapping names, keep the rest
pub fn project_rename(record: &Record, mapping: &KeyMapping) -> Record {
    let mut out = Record::new();
    for (key, value) in record {
        let new_key = mapping.rename_of(key).unwrap_or(key);
        out.insert(new_key.to_string(), value.clone());
    }
    out
}

/// Project `record` according to `mode`
pub fn project(
    record: &Record,
    mapping: &KeyMapping,
    defaults: &DefaultMap,
    fallback: &Value,
    mode: ProjectionMode,
) -> Record {
    match mode {
        ProjectionMode::New => project_new(record, mapping, defaults, fallback),
        ProjectionMode::Rename => project_rename(record, mapping),
        ProjectionMode::Update => {
            let mut out = project_rename(record, mapping);
            for (key, default) in defaults {
                if record.contains_key(key) {
                    continue;
                }
                let new_key = mapping.rename_of(key).unwrap_or(key);
                let value = defaults.get(new_key).unwrap_or(default);
                out.insert(new_key.to_string(), value.clone());
            }
            out
        }
    }
}

/// Apply [`project`] to every record
pub fn project_all(
    records: &[Record],
    mapping: &KeyMapping,
    defaults: &DefaultMap,
    fallback: &Value,
    mode: ProjectionMode,
) -> Vec<Record> {
    records
        .iter()
        .map(|r| project(r, mapping, defaults, fallback, mode))
        .collect()
}

fn resolve(
    record: &Record,
    old_key: &str,
    new_key: &str,
    defaults: &DefaultMap,
    fallback: &Value,
) -> Value {
    record
        .get(old_key)
        .or_else(|| defaults.get(new_key))
        .cloned()
        .unwrap_or_else(|| fallback.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn setup() -> (Record, KeyMapping, DefaultMap) {
        let record = rec(json!({"a": 1, "b": 2, "c": 3}));
        let mapping = KeyMapping::from_pairs(vec![("a", "a1"), ("c", "c1"), ("d", "d1")]);
        let defaults = rec(json!({"d1": "dflt"}));
        (record, mapping, defaults)
    }

    fn keys(r: &Record) -> Vec<&str> {
        r.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_project_new() {
        let (record, mapping, defaults) = setup();
        let out = project_new(&record, &mapping, &defaults, &json!(""));
        assert_eq!(Value::Object(out.clone()), json!({"a1": 1, "c1": 3, "d1": "dflt"}));
        assert_eq!(keys(&out), vec!["a1", "c1", "d1"]);
    }

    #[test]
    fn test_project_new_falls_back() {
        let (record, mapping, _) = setup();
        let out = project_new(&record, &mapping, &Record::new(), &json!("-"));
        assert_eq!(out.get("d1"), Some(&json!("-")));
    }

    #[test]
    fn test_project_new_keeps_explicit_null() {
        let record = rec(json!({"a": null}));
        let mapping = KeyMapping::from_pairs(vec![("a", "x")]);
        let defaults = rec(json!({"x": 5}));
        let out = project_new(&record, &mapping, &defaults, &json!(""));
        assert_eq!(out.get("x"), Some(&Value::Null));
    }

    #[test]
    fn test_project_rename() {
        let (record, mapping, _) = setup();
        let out = project_rename(&record, &mapping);
        assert_eq!(keys(&out), vec!["a1", "b", "c1"]);
        assert_eq!(Value::Object(out), json!({"a1": 1, "b": 2, "c1": 3}));
    }

    #[test]
    fn test_project_update() {
        let (record, mapping, defaults) = setup();
        let out = project(&record, &mapping, &defaults, &json!(""), ProjectionMode::Update);
        assert_eq!(keys(&out), vec!["a1", "b", "c1", "d1"]);
        assert_eq!(
            Value::Object(out),
            json!({"a1": 1, "b": 2, "c1": 3, "d1": "dflt"})
        );
    }

    #[test]
    fn test_project_update_renames_default_only_field() {
        let record = rec(json!({"a": 1}));
        let mapping = KeyMapping::from_pairs(vec![("z", "z1")]);
        let defaults = rec(json!({"z": 9}));
        let out = project(&record, &mapping, &defaults, &json!(""), ProjectionMode::Update);
        assert_eq!(Value::Object(out), json!({"a": 1, "z1": 9}));
    }

    #[test]
    fn test_project_new_ignores_defaults_under_old_name() {
        let record = Record::new();
        let mapping = KeyMapping::from_pairs(vec![("a", "a1")]);
        let defaults = rec(json!({"a": 5}));
        let out = project_new(&record, &mapping, &defaults, &json!("-"));
        assert_eq!(out.get("a1"), Some(&json!("-")));
    }

    #[test]
    fn test_project_dispatches_on_mode() {
        let (record, mapping, defaults) = setup();
        let fallback = json!("");
        assert_eq!(
            project(&record, &mapping, &defaults, &fallback, ProjectionMode::New),
            project_new(&record, &mapping, &defaults, &fallback)
        );
        assert_eq!(
            project(&record, &mapping, &defaults, &fallback, ProjectionMode::Rename),
            project_rename(&record, &mapping)
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("NEW".parse::<ProjectionMode>().unwrap(), ProjectionMode::New);
        assert_eq!("Rename".parse::<ProjectionMode>().unwrap(), ProjectionMode::Rename);
        assert_eq!("update".parse::<ProjectionMode>().unwrap(), ProjectionMode::Update);
        assert!(matches!(
            "merge".parse::<ProjectionMode>(),
            Err(Error::InvalidMode(_))
        ));
    }

    #[test]
    fn test_mode_serde_ignores_case() {
        let mode: ProjectionMode = serde_json::from_str(r#""Update""#).unwrap();
        assert_eq!(mode, ProjectionMode::Update);
        assert_eq!(serde_json::to_string(&ProjectionMode::Rename).unwrap(), r#""rename""#);
        assert!(serde_json::from_str::<ProjectionMode>(r#""merge""#).is_err());
    }

    #[test]
    fn test_project_all() {
        let (record, mapping, defaults) = setup();
        let out = project_all(
            &[record.clone(), Record::new()],
            &mapping,
            &defaults,
            &json!(""),
            ProjectionMode::New,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(Value::Object(out[1].clone()), json!({"a1": "", "c1": "", "d1": "dflt"}));
    }
}
