//! Three-way reconciliation of two record snapshots
//!
//! Records are the same entity when every composite key field compares equal.
//! A new record with no old counterpart is added; one whose counterpart
//! differs in any of the new record's fields is updated; an old record with
//! no new counterpart is deleted.
//!
//! When a snapshot holds duplicate key values only the first occurrence is
//! ever matched. The lookup index keeps the first position per key, so this
//! holds while running in O(old + new).

use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::write_canonical;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Classified records, in the order of the snapshot they came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Present only in the new snapshot
    pub added: Vec<Record>,
    /// Present only in the old snapshot
    pub deleted: Vec<Record>,
    /// Present in both, with at least one differing field
    pub updated: Vec<Record>,
}

impl ReconciliationResult {
    /// No additions, deletions or updates
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            added: self.added.len(),
            deleted: self.deleted.len(),
            updated: self.updated.len(),
        }
    }
}

/// Counts per classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
}

/// Compute added, deleted and updated records between two snapshots
///
/// A key field missing from a record counts as a distinct "absent" value:
/// two records that both lack it are equal on it, and absent never equals an
/// explicit `null`. Use [`validate_composite_key`] to reject such records up
/// front.
pub fn get_upsert_diff<S: AsRef<str>>(
    old_records: &[Record],
    new_records: &[Record],
    composite_key: &[S],
) -> ReconciliationResult {
    let old_index = first_index(old_records, composite_key);
    let new_index = first_index(new_records, composite_key);

    let mut result = ReconciliationResult::default();

    for new in new_records {
        match old_index.get(&fingerprint(new, composite_key)) {
            None => result.added.push(new.clone()),
            Some(&i) => {
                if !fields_match(new, &old_records[i]) {
                    result.updated.push(new.clone());
                }
            }
        }
    }

    for old in old_records {
        if !new_index.contains_key(&fingerprint(old, composite_key)) {
            result.deleted.push(old.clone());
        }
    }

    debug!(
        old = old_records.len(),
        new = new_records.len(),
        added = result.added.len(),
        deleted = result.deleted.len(),
        updated = result.updated.len(),
        "reconciled snapshots"
    );

    result
}

/// Check that every record carries every composite key field
pub fn validate_composite_key<S: AsRef<str>>(records: &[Record], composite_key: &[S]) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        if let Some(field) = composite_key
            .iter()
            .map(|f| f.as_ref())
            .find(|f| !record.contains_key(*f))
        {
            return Err(Error::MissingKeyField {
                index,
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Every field of `new` is present in `old` with an equal value
fn fields_match(new: &Record, old: &Record) -> bool {
    new.iter().all(|(k, v)| old.get(k) == Some(v))
}

/// Position of the first record for each distinct key value
fn first_index<S: AsRef<str>>(records: &[Record], composite_key: &[S]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        index.entry(fingerprint(record, composite_key)).or_insert(i);
    }
    index
}

/// Encoding of a record's key values; equal iff all key fields compare equal
fn fingerprint<S: AsRef<str>>(record: &Record, composite_key: &[S]) -> String {
    let mut out = String::new();
    for field in composite_key {
        match record.get(field.as_ref()) {
            Some(value) => write_canonical(value, &mut out),
            // absent; canonical JSON never contains a raw NUL
            None => out.push('\0'),
        }
        out.push('\u{1f}');
    }
    out
}
