//! CSV and JSON file adapters
//!
//! These stand in for the external readers and writers that feed the engine.
//! The engine modules never call them.

use crate::converter::{records_from_table, table_from_records};
use crate::error::{Error, Result};
use crate::mapping::KeyMapping;
use crate::record::Record;
use crate::table::Table;
use crate::value::{parse_cell, to_cell_text, Value};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Data loaded from a file, in whichever shape the file held
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A CSV file or a JSON array of arrays
    Table(Table),
    /// A JSON array of objects
    Records(Vec<Record>),
}

impl Source {
    /// Load a `.csv` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P, infer_types: bool) -> Result<Self> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            read_csv(path, infer_types).map(Source::Table)
        } else {
            let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            parse_json_str(&content, path)
        }
    }

    /// Records view; a table is converted through `mapping`
    ///
    /// Records are returned untouched, `mapping` does not apply to them.
    pub fn into_records(self, mapping: &KeyMapping, fallback: &Value) -> Vec<Record> {
        match self {
            Source::Table(table) => records_from_table(&table, mapping, fallback),
            Source::Records(records) => records,
        }
    }

    /// Table view; records are converted through `mapping`
    ///
    /// A table is returned untouched, `mapping` does not apply to it.
    pub fn into_table(self, mapping: &KeyMapping, fallback: &Value) -> Table {
        match self {
            Source::Table(table) => table,
            Source::Records(records) => table_from_records(&records, mapping, fallback),
        }
    }
}

/// Parse a CSV file into a Table
pub fn read_csv<P: AsRef<Path>>(path: P, infer_types: bool) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_csv_reader(BufReader::new(file), path, infer_types)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str, infer_types: bool) -> Result<Table> {
    parse_csv_reader(content.as_bytes(), Path::new(source_name), infer_types)
}

fn parse_csv_reader<R: Read>(reader: R, path: &Path, infer_types: bool) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows degrade to the fallback later
        .from_reader(reader);

    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        if record.len() > header.len() {
            warn!(
                row = row_idx + 1,
                path = %path.display(),
                "row has more cells than the header"
            );
        }
        rows.push(record.iter().map(|c| parse_cell(c, infer_types)).collect());
    }

    debug!(path = %path.display(), rows = rows.len(), "parsed CSV");
    Ok(Table::new(header, rows))
}

/// Parse JSON text holding either a record array or a matrix
pub fn parse_json_str(content: &str, path: &Path) -> Result<Source> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(invalid(path, "expected a JSON array"));
    };

    if items.iter().all(Value::is_object) {
        let records = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        return Ok(Source::Records(records));
    }

    if items.iter().all(Value::is_array) {
        let matrix = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Array(row) => Some(row),
                _ => None,
            })
            .collect();
        return Ok(Source::Table(Table::from_matrix(matrix)));
    }

    Err(invalid(
        path,
        "expected an array of objects or an array of arrays",
    ))
}

/// Write a table as CSV
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv_to(table, BufWriter::new(file), path)
}

/// Render a table as CSV text
pub fn csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_csv_to(table, &mut buf, Path::new("<memory>"))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_csv_to<W: Write>(table: &Table, writer: W, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);

    writer
        .write_record(&table.header)
        .map_err(|e| csv_error(path, e))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(to_cell_text))
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

fn csv_error(path: &Path, source: csv::Error) -> Error {
    Error::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn invalid(path: &Path, message: &str) -> Error {
    Error::InvalidInput {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}
