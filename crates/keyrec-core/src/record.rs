//! Keyed records and small record utilities

use crate::value::{to_field_name, Value};

/// An ordered mapping from field name to value
///
/// Backed by an insertion-ordered map, so the first record of a sequence can
/// stand in for a header.
pub type Record = serde_json::Map<String, Value>;

/// Per-field fallback values, keyed by the (new) field name
pub type DefaultMap = Record;

/// Return a copy of `record` without the named fields
///
/// Names that are not present are ignored.
pub fn remove_fields<S: AsRef<str>>(record: &Record, fields: &[S]) -> Record {
    record
        .iter()
        .filter(|(k, _)| !fields.iter().any(|f| f.as_ref() == k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Return a copy of `record` without `field`
pub fn remove_field(record: &Record, field: &str) -> Record {
    remove_fields(record, &[field])
}

/// Swap field names and values
///
/// Values become field names (non-string values use their JSON text). When
/// two fields share a value the later one wins but keeps the slot of the
/// first, so this does not round-trip.
pub fn invert(record: &Record) -> Record {
    let mut inverted = Record::new();
    for (key, value) in record {
        inverted.insert(to_field_name(value), Value::String(key.clone()));
    }
    inverted
}

/// Values of `field` across `records`, `null` where it is absent
pub fn column_values(records: &[Record], field: &str) -> Vec<Value> {
    records
        .iter()
        .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Zip field names with values into a record
///
/// Names past the end of `values` get `null`; surplus values are dropped.
pub fn record_from_pair<S: AsRef<str>>(keys: &[S], values: &[Value]) -> Record {
    keys.iter()
        .enumerate()
        .map(|(i, k)| {
            (
                k.as_ref().to_string(),
                values.get(i).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

/// Build one record per value row, all sharing `keys`
pub fn records_from_pairs<S: AsRef<str>>(keys: &[S], rows: &[Vec<Value>]) -> Vec<Record> {
    rows.iter().map(|row| record_from_pair(keys, row)).collect()
}

/// Split a record into its field names and values, in record order
pub fn pair_from_record(record: &Record) -> (Vec<String>, Vec<Value>) {
    record.iter().map(|(k, v)| (k.clone(), v.clone())).unzip()
}

/// Field names of a record joined for messages
pub(crate) fn field_list(record: &Record) -> String {
    record.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
