//! keyrec-core: reshape tables into keyed records and reconcile snapshots
//!
//! This library provides functionality to:
//! - Project records: rename, filter and default their fields
//! - Convert between row-major tables and sequences of records
//! - Diff two record snapshots by composite key into added, deleted and
//!   updated records
//! - Load and save job files and CSV / JSON data at the edges

pub mod config;
pub mod converter;
pub mod error;
pub mod mapping;
pub mod projector;
pub mod reconcile;
pub mod record;
pub mod source;
pub mod table;
pub mod value;

pub use config::JobConfig;
pub use converter::{
    add_default_columns, column_from_table, matrix_from_records, records_from_matrix,
    records_from_table, resolve_header, table_from_records, table_from_records_strict,
    table_from_records_with_header, IndexPlan, Placement, ResolvedHeader,
};
pub use error::{Error, Result};
pub use mapping::KeyMapping;
pub use projector::{project, project_all, project_new, project_rename, ProjectionMode};
pub use reconcile::{get_upsert_diff, validate_composite_key, DiffSummary, ReconciliationResult};
pub use record::{
    column_values, invert, pair_from_record, record_from_pair, records_from_pairs, remove_field,
    remove_fields, DefaultMap, Record,
};
pub use source::Source;
pub use table::Table;
pub use value::{parse_cell, Value};
