//! Key mappings: ordered old-name to new-name projections

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parallel lists of old and new field names
///
/// The i-th old name maps to the i-th new name. An empty mapping is the
/// identity over whatever header or record it is applied to. Serialized as a
/// list of `[old, new]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct KeyMapping {
    old_keys: Vec<String>,
    new_keys: Vec<String>,
}

impl KeyMapping {
    /// Create a mapping from parallel key lists
    pub fn new<S: Into<String>>(
        old_keys: impl IntoIterator<Item = S>,
        new_keys: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let old_keys: Vec<String> = old_keys.into_iter().map(Into::into).collect();
        let new_keys: Vec<String> = new_keys.into_iter().map(Into::into).collect();
        if old_keys.len() != new_keys.len() {
            return Err(Error::MappingLength {
                old: old_keys.len(),
                new: new_keys.len(),
            });
        }
        Ok(Self { old_keys, new_keys })
    }

    /// The identity (empty) mapping
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a mapping from `(old, new)` pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, S)>) -> Self {
        let (old_keys, new_keys) = pairs
            .into_iter()
            .map(|(o, n)| (o.into(), n.into()))
            .unzip();
        Self { old_keys, new_keys }
    }

    /// Check whether this is the identity mapping
    pub fn is_identity(&self) -> bool {
        self.old_keys.is_empty()
    }

    /// Number of mapped fields
    pub fn len(&self) -> usize {
        self.old_keys.len()
    }

    /// Same as [`is_identity`](Self::is_identity)
    pub fn is_empty(&self) -> bool {
        self.old_keys.is_empty()
    }

    pub fn old_keys(&self) -> &[String] {
        &self.old_keys
    }

    pub fn new_keys(&self) -> &[String] {
        &self.new_keys
    }

    /// New name for `old_key`; the first pair naming it wins
    pub fn rename_of(&self, old_key: &str) -> Option<&str> {
        self.old_keys
            .iter()
            .position(|k| k == old_key)
            .map(|i| self.new_keys[i].as_str())
    }

    /// Iterate over `(old, new)` pairs in order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.old_keys
            .iter()
            .zip(&self.new_keys)
            .map(|(o, n)| (o.as_str(), n.as_str()))
    }
}

impl From<Vec<(String, String)>> for KeyMapping {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<KeyMapping> for Vec<(String, String)> {
    fn from(mapping: KeyMapping) -> Self {
        mapping.old_keys.into_iter().zip(mapping.new_keys).collect()
    }
}
