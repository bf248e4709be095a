//! Conversion between tables and record sequences
//!
//! Column positions are resolved once per call into an [`IndexPlan`] and that
//! plan is reused for every row. A column that cannot be resolved, or a row
//! too short to reach it, degrades to the caller's fallback value.

use crate::error::{Error, Result};
use crate::mapping::KeyMapping;
use crate::record::{field_list, DefaultMap, Record};
use crate::table::Table;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Source position for each output column; `None` when the source lacks it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPlan(pub Vec<Option<usize>>);

impl IndexPlan {
    /// Positions with `-1` marking unresolved columns
    pub fn to_signed(&self) -> Vec<i64> {
        self.0
            .iter()
            .map(|i| i.map_or(-1, |i| i as i64))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of columns that resolved to a source position
    pub fn resolved_count(&self) -> usize {
        self.0.iter().filter(|i| i.is_some()).count()
    }

    /// Pick the value for output column `column` from a source row
    fn pick<'a>(&self, column: usize, row: &'a [Value]) -> Option<&'a Value> {
        self.0[column].and_then(|i| row.get(i))
    }
}

/// Output header together with its plan against the source header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    pub header: Vec<String>,
    pub plan: IndexPlan,
}

/// Where [`add_default_columns`] places the new columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Prepend,
    Append,
}

/// Resolve the output header and index plan for `old_header`
///
/// The identity mapping keeps the header and maps every column to itself.
/// Otherwise the header is the mapping's new keys, each pointing at the first
/// position of its old key in `old_header`.
pub fn resolve_header<S: AsRef<str>>(old_header: &[S], mapping: &KeyMapping) -> ResolvedHeader {
    if mapping.is_identity() {
        return ResolvedHeader {
            header: old_header.iter().map(|h| h.as_ref().to_string()).collect(),
            plan: IndexPlan((0..old_header.len()).map(Some).collect()),
        };
    }

    let plan = IndexPlan(
        mapping
            .old_keys()
            .iter()
            .map(|k| old_header.iter().position(|h| h.as_ref() == k.as_str()))
            .collect(),
    );

    debug!(
        columns = plan.len(),
        resolved = plan.resolved_count(),
        "resolved header plan"
    );

    ResolvedHeader {
        header: mapping.new_keys().to_vec(),
        plan,
    }
}

/// Build one record per data row of `table`
pub fn records_from_table(table: &Table, mapping: &KeyMapping, fallback: &Value) -> Vec<Record> {
    let ResolvedHeader { header, plan } = resolve_header(table.header.as_slice(), mapping);

    table
        .rows
        .iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = plan.pick(i, row).cloned().unwrap_or_else(|| fallback.clone());
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Build a table from records, taking the first record's field order as header
///
/// Later records are assumed to share the first record's field set; a record
/// that lacks a header field gets `fallback` in that position. Drift is
/// logged, not rejected; see [`table_from_records_strict`].
pub fn table_from_records(records: &[Record], mapping: &KeyMapping, fallback: &Value) -> Table {
    let Some(first) = records.first() else {
        return Table::default();
    };

    if let Some(index) = first_drift(records) {
        warn!(
            index,
            expected = %field_list(first),
            found = %field_list(&records[index]),
            "record field set differs from the first record"
        );
    }

    let implicit: Vec<&str> = first.keys().map(String::as_str).collect();
    build_table(records, &implicit, mapping, fallback)
}

/// Like [`table_from_records`] but fails on the first record whose field set
/// differs from the first record's
pub fn table_from_records_strict(
    records: &[Record],
    mapping: &KeyMapping,
    fallback: &Value,
) -> Result<Table> {
    if let Some(index) = first_drift(records) {
        return Err(Error::SchemaMismatch {
            index,
            expected: field_list(&records[0]),
            found: field_list(&records[index]),
        });
    }
    Ok(table_from_records(records, mapping, fallback))
}

/// Build a table whose header is given explicitly
///
/// Fields missing from a record degrade to `fallback`; extra fields are
/// ignored.
pub fn table_from_records_with_header<S: AsRef<str>>(
    records: &[Record],
    header: &[S],
    fallback: &Value,
) -> Table {
    let header: Vec<&str> = header.iter().map(|h| h.as_ref()).collect();
    build_table(records, &header, &KeyMapping::identity(), fallback)
}

/// Matrix form of `records` with the first record's keys as header, no renaming
///
/// Fields absent from a later record become `null`.
pub fn matrix_from_records(records: &[Record]) -> Table {
    table_from_records(records, &KeyMapping::identity(), &Value::Null)
}

/// Records from a table's rows keyed by its header, no renaming
///
/// Positions past the end of a short row become `null`.
pub fn records_from_matrix(table: &Table) -> Vec<Record> {
    records_from_table(table, &KeyMapping::identity(), &Value::Null)
}

/// One column of the table's matrix form
///
/// With `include_header` the header cell comes first. Short rows give `null`.
pub fn column_from_table(table: &Table, index: usize, include_header: bool) -> Vec<Value> {
    let header = include_header.then(|| {
        table
            .header
            .get(index)
            .map(|h| Value::String(h.clone()))
            .unwrap_or(Value::Null)
    });
    header
        .into_iter()
        .chain(
            table
                .rows
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or(Value::Null)),
        )
        .collect()
}

/// Add one column per default to the header, filled with the default value
pub fn add_default_columns(table: &Table, defaults: &DefaultMap, placement: Placement) -> Table {
    let names = defaults.keys().cloned();
    let values: Vec<Value> = defaults.values().cloned().collect();

    let join = |existing: &[Value]| -> Vec<Value> {
        match placement {
            Placement::Prepend => values.iter().chain(existing).cloned().collect(),
            Placement::Append => existing.iter().chain(&values).cloned().collect(),
        }
    };

    let header = match placement {
        Placement::Prepend => names.chain(table.header.iter().cloned()).collect(),
        Placement::Append => table.header.iter().cloned().chain(names).collect(),
    };

    Table {
        header,
        rows: table.rows.iter().map(|row| join(row.as_slice())).collect(),
    }
}

fn build_table(
    records: &[Record],
    source_header: &[&str],
    mapping: &KeyMapping,
    fallback: &Value,
) -> Table {
    let ResolvedHeader { header, plan } = resolve_header(source_header, mapping);

    let rows = records
        .iter()
        .map(|record| {
            plan.0
                .iter()
                .map(|slot| {
                    slot.and_then(|i| record.get(source_header[i]))
                        .cloned()
                        .unwrap_or_else(|| fallback.clone())
                })
                .collect()
        })
        .collect();

    Table { header, rows }
}

/// Index of the first record whose field set differs from the first record's
fn first_drift(records: &[Record]) -> Option<usize> {
    let first = records.first()?;
    records.iter().position(|r| {
        r.len() != first.len() || !first.keys().all(|k| r.contains_key(k.as_str()))
    })
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

    fn strings(v: &[&str]) -> Vec<Value> {
        v.iter().map(|s| json!(s)).collect()
    }

    #[test]
    fn test_resolve_header_partial_mapping() {
        let mapping = KeyMapping::new(vec!["h3", "h4", "h1"], vec!["_h3", "_h4", "_h1"]).unwrap();
        let resolved = resolve_header(&["h1", "h2", "h3"], &mapping);
        assert_eq!(resolved.header, vec!["_h3", "_h4", "_h1"]);
        assert_eq!(resolved.plan.to_signed(), vec![2, -1, 0]);
        assert_eq!(resolved.plan.resolved_count(), 2);
    }

    #[test]
    fn test_resolve_header_identity() {
        let resolved = resolve_header(&["a", "b"], &KeyMapping::identity());
        assert_eq!(resolved.header, vec!["a", "b"]);
        assert_eq!(resolved.plan, IndexPlan(vec![Some(0), Some(1)]));
    }

    #[test]
    fn test_records_from_table_with_defaulting() {
        let table = Table::from_matrix(vec![
            strings(&["h1", "h2"]),
            strings(&["v11", "v12"]),
            strings(&["v21", "v22"]),
        ]);
        let mapping = KeyMapping::new(vec!["h2", "h3", "h1"], vec!["_h2", "_h3", "_h1"]).unwrap();

        let records = records_from_table(&table, &mapping, &json!(""));
        assert_eq!(
            records,
            vec![
                rec(json!({"_h2": "v12", "_h3": "", "_h1": "v11"})),
                rec(json!({"_h2": "v22", "_h3": "", "_h1": "v21"})),
            ]
        );
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["_h2", "_h3", "_h1"]
        );
    }

    #[test]
    fn test_records_from_table_ragged_row() {
        let table = Table::from_matrix(vec![strings(&["a", "b"]), strings(&["1"])]);
        let records = records_from_table(&table, &KeyMapping::identity(), &json!("?"));
        assert_eq!(records, vec![rec(json!({"a": "1", "b": "?"}))]);
    }

    #[test]
    fn test_records_from_empty_table() {
        let table = Table::with_header(["a", "b"]);
        assert!(records_from_table(&table, &KeyMapping::identity(), &json!("")).is_empty());
        assert!(records_from_matrix(&Table::default()).is_empty());
    }

    #[test]
    fn test_table_from_records_with_mapping() {
        let records = vec![
            rec(json!({"h1": "v11", "h2": "v12", "h3": "v13"})),
            rec(json!({"h1": "v21", "h2": "v22", "h3": "v13"})),
        ];
        let mapping = KeyMapping::new(vec!["h3", "h4", "h1"], vec!["_h3", "_h4", "_h1"]).unwrap();

        let table = table_from_records(&records, &mapping, &json!("_v_"));
        assert_eq!(
            table.to_matrix(),
            vec![
                strings(&["_h3", "_h4", "_h1"]),
                strings(&["v13", "_v_", "v11"]),
                strings(&["v13", "_v_", "v21"]),
            ]
        );
    }

    #[test]
    fn test_table_from_records_empty() {
        let table = table_from_records(&[], &KeyMapping::identity(), &json!(""));
        assert_eq!(table, Table::default());
    }

    #[test]
    fn test_table_from_records_drift_is_lenient() {
        let records = vec![rec(json!({"a": 1, "b": 2})), rec(json!({"a": 3, "c": 4}))];
        let table = table_from_records(&records, &KeyMapping::identity(), &json!(0));
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows[1], vec![json!(3), json!(0)]);
    }

    #[test]
    fn test_table_from_records_strict_rejects_drift() {
        let records = vec![
            rec(json!({"a": 1, "b": 2})),
            rec(json!({"b": 5, "a": 6})),
            rec(json!({"a": 3, "c": 4})),
        ];
        let err = table_from_records_strict(&records, &KeyMapping::identity(), &json!(""))
            .unwrap_err();
        match err {
            Error::SchemaMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 2);
                assert_eq!(expected, "a, b");
                assert_eq!(found, "a, c");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_table_from_records_strict_accepts_reordered_fields() {
        let records = vec![rec(json!({"a": 1, "b": 2})), rec(json!({"b": 5, "a": 6}))];
        let table =
            table_from_records_strict(&records, &KeyMapping::identity(), &json!("")).unwrap();
        assert_eq!(table.rows[1], vec![json!(6), json!(5)]);
    }

    #[test]
    fn test_table_from_records_with_header() {
        let records = vec![rec(json!({"a": 1, "b": 2})), rec(json!({"c": 3}))];
        let table = table_from_records_with_header(&records, &["b", "c"], &json!(""));
        assert_eq!(table.header, vec!["b", "c"]);
        assert_eq!(table.rows, vec![vec![json!(2), json!("")], vec![json!(""), json!(3)]]);
    }

    #[test]
    fn test_matrix_round_trip() {
        let table = Table::from_matrix(vec![
            strings(&["id", "name"]),
            vec![json!(1), json!("foo")],
            vec![json!(2), json!({"nested": true})],
        ]);
        assert_eq!(matrix_from_records(&records_from_matrix(&table)), table);
    }

    #[test]
    fn test_column_from_table() {
        let table = Table::from_matrix(vec![
            strings(&["a", "b"]),
            vec![json!(1), json!(2)],
            vec![json!(3)],
        ]);
        assert_eq!(column_from_table(&table, 1, false), vec![json!(2), Value::Null]);
        assert_eq!(
            column_from_table(&table, 0, true),
            vec![json!("a"), json!(1), json!(3)]
        );
    }

    #[test]
    fn test_add_default_columns() {
        let table = Table::from_matrix(vec![
            strings(&["h1", "h2"]),
            strings(&["v11", "v12"]),
            strings(&["v21", "v22"]),
        ]);
        let defaults = rec(json!({"h3": ""}));

        let appended = add_default_columns(&table, &defaults, Placement::Append);
        assert_eq!(
            appended.to_matrix(),
            vec![
                strings(&["h1", "h2", "h3"]),
                strings(&["v11", "v12", ""]),
                strings(&["v21", "v22", ""]),
            ]
        );

        let prepended = add_default_columns(&table, &defaults, Placement::Prepend);
        assert_eq!(prepended.header, vec!["h3", "h1", "h2"]);
        assert_eq!(prepended.rows[0], strings(&["", "v11", "v12"]));
    }
}
