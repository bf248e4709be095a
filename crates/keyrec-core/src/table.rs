//! Row-major tables: a header plus positionally aligned data rows

use crate::value::{to_field_name, Value};
use serde::{Deserialize, Serialize};

/// A header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, unique within the table
    pub header: Vec<String>,
    /// Data rows, aligned with `header` (may be ragged)
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from a header and rows
    pub fn new(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { header, rows }
    }

    /// Create a table with a header and no data rows
    pub fn with_header<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from matrix form, where row 0 is the header
    ///
    /// An empty matrix gives an empty table.
    pub fn from_matrix(matrix: Vec<Vec<Value>>) -> Self {
        let mut rows = matrix.into_iter();
        let header = rows
            .next()
            .map(|h| h.iter().map(to_field_name).collect())
            .unwrap_or_default();
        Self {
            header,
            rows: rows.collect(),
        }
    }

    /// Matrix form of the table, header first
    ///
    /// A table with neither header nor rows gives an empty matrix.
    pub fn to_matrix(&self) -> Vec<Vec<Value>> {
        if self.header.is_empty() && self.rows.is_empty() {
            return Vec::new();
        }
        let mut matrix = Vec::with_capacity(self.rows.len() + 1);
        matrix.push(self.header.iter().cloned().map(Value::String).collect());
        matrix.extend(self.rows.iter().cloned());
        matrix
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Get the number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column position by name
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Get a cell, `None` if the row is missing or too short
    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}
