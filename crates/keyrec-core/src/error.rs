//! Error types for keyrec-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keyrec-core
///
/// The reshaping and reconciliation operations themselves never fail; these
/// variants come from validation, configuration loading and I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Input file has a shape we cannot use
    #[error("invalid input '{path}': {message}")]
    InvalidInput { path: PathBuf, message: String },

    /// Old and new key lists of a mapping differ in length
    #[error("key mapping has {old} old keys but {new} new keys")]
    MappingLength { old: usize, new: usize },

    /// Unknown projection mode
    #[error("unknown projection mode '{0}' (expected new, rename or update)")]
    InvalidMode(String),

    /// A record's field set differs from the first record's
    #[error("record {index} has fields [{found}], expected [{expected}]")]
    SchemaMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// A record lacks one of the composite key fields
    #[error("record {index} is missing composite key field '{field}'")]
    MissingKeyField { index: usize, field: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
