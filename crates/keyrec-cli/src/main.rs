//! keyrec CLI
//!
//! Command-line tool for reshaping CSV/JSON tables into records and back, and
//! for diffing two record snapshots by composite key.

use clap::{Parser, Subcommand};
use keyrec_core::source::{csv_string, write_csv, write_json};
use keyrec_core::{
    get_upsert_diff, project_all, records_from_table, table_from_records,
    table_from_records_strict, table_from_records_with_header, validate_composite_key, JobConfig,
    KeyMapping, ProjectionMode, Record, Source, Table, Value,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "keyrec")]
#[command(about = "Keyed-record reshaping and reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a table (CSV or JSON matrix) into JSON records
    ToRecords {
        /// Input table file
        #[arg(short, long)]
        input: PathBuf,

        /// Job file with mapping, fallback and type inference
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert JSON records into a table (CSV or JSON matrix by extension)
    ToTable {
        /// Input records file
        #[arg(short, long)]
        input: PathBuf,

        /// Job file with mapping and fallback
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Explicit header (comma-separated), instead of the first record's fields
        #[arg(long)]
        header: Option<String>,

        /// Fail if records do not all share the first record's fields
        #[arg(long)]
        strict: bool,

        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rename, filter and default the fields of every record
    Project {
        /// Input records or table file
        #[arg(short, long)]
        input: PathBuf,

        /// Job file with mapping, defaults and fallback
        #[arg(short, long)]
        config: PathBuf,

        /// Projection mode (new, rename or update), overrides the job file
        #[arg(short, long)]
        mode: Option<ProjectionMode>,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Diff two snapshots into added, deleted and updated records
    Diff {
        /// Old snapshot
        #[arg(long)]
        old: PathBuf,

        /// New snapshot
        #[arg(long)]
        new: PathBuf,

        /// Composite key fields (comma-separated), overrides the job file
        #[arg(short, long)]
        key: Option<String>,

        /// Job file applied to table inputs before diffing
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reject records missing a composite key field
        #[arg(long)]
        strict_keys: bool,

        /// Output JSON file for the full result
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display a table or records file
    Show {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Parse numeric CSV cells as numbers
        #[arg(long)]
        infer_types: bool,
    },

    /// Create a job file template
    CreateConfig {
        /// Output path for the job file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn run(command: Commands) -> keyrec_core::Result<()> {
    match command {
        Commands::ToRecords {
            input,
            config,
            output,
        } => cmd_to_records(&input, config.as_deref(), output.as_deref()),
        Commands::ToTable {
            input,
            config,
            header,
            strict,
            output,
        } => cmd_to_table(&input, config.as_deref(), header, strict, &output),
        Commands::Project {
            input,
            config,
            mode,
            output,
        } => cmd_project(&input, &config, mode, output.as_deref()),
        Commands::Diff {
            old,
            new,
            key,
            config,
            strict_keys,
            output,
        } => cmd_diff(
            &old,
            &new,
            key,
            config.as_deref(),
            strict_keys,
            output.as_deref(),
        ),
        Commands::Show {
            input,
            limit,
            infer_types,
        } => cmd_show(&input, limit, infer_types),
        Commands::CreateConfig { output } => cmd_create_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> keyrec_core::Result<JobConfig> {
    match path {
        Some(p) => {
            let config = JobConfig::load(p)?;
            debug!(path = %p.display(), mappings = config.mapping.len(), "loaded job file");
            Ok(config)
        }
        None => Ok(JobConfig::default()),
    }
}

fn load_records(path: &Path, config: &JobConfig) -> keyrec_core::Result<Vec<Record>> {
    let source = Source::load(path, config.infer_types)?;
    Ok(source.into_records(&config.mapping, &config.fallback))
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn emit_json<T: serde::Serialize + ?Sized>(
    value: &T,
    output: Option<&Path>,
) -> keyrec_core::Result<()> {
    match output {
        Some(path) => write_json(value, path),
        None => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}

fn cmd_to_records(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
) -> keyrec_core::Result<()> {
    let config = load_config(config)?;
    let records = match Source::load(input, config.infer_types)? {
        Source::Table(table) => records_from_table(&table, &config.mapping, &config.fallback),
        Source::Records(records) => {
            info!("input already holds records, mapping not applied");
            records
        }
    };

    emit_json(&records, output)?;
    if let Some(path) = output {
        info!(records = records.len(), path = %path.display(), "wrote records");
    }
    Ok(())
}

fn cmd_to_table(
    input: &Path,
    config: Option<&Path>,
    header: Option<String>,
    strict: bool,
    output: &Path,
) -> keyrec_core::Result<()> {
    let config = load_config(config)?;
    let table = match Source::load(input, config.infer_types)? {
        Source::Table(table) => {
            info!("input already holds a table, record options not applied");
            table
        }
        Source::Records(records) => match header {
            Some(h) => table_from_records_with_header(&records, &split_list(&h), &config.fallback),
            None if strict => {
                table_from_records_strict(&records, &config.mapping, &config.fallback)?
            }
            None => table_from_records(&records, &config.mapping, &config.fallback),
        },
    };

    let is_json = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        write_json(&table.to_matrix(), output)?;
    } else {
        write_csv(&table, output)?;
    }

    info!(rows = table.row_count(), path = %output.display(), "wrote table");
    Ok(())
}

fn cmd_project(
    input: &Path,
    config: &Path,
    mode: Option<ProjectionMode>,
    output: Option<&Path>,
) -> keyrec_core::Result<()> {
    let config = JobConfig::load(config)?;
    let mode = mode.unwrap_or(config.mode);

    // tables become records as-is; the mapping is applied by the projection
    let records = Source::load(input, config.infer_types)?
        .into_records(&KeyMapping::identity(), &config.fallback);
    let projected = project_all(
        &records,
        &config.mapping,
        &config.defaults,
        &config.fallback,
        mode,
    );

    info!(records = projected.len(), %mode, "projected records");
    emit_json(&projected, output)
}

fn cmd_diff(
    old: &Path,
    new: &Path,
    key: Option<String>,
    config: Option<&Path>,
    strict_keys: bool,
    output: Option<&Path>,
) -> keyrec_core::Result<()> {
    let config = load_config(config)?;
    let key = key
        .map(|k| split_list(&k))
        .unwrap_or_else(|| config.composite_key.clone());

    let old_records = load_records(old, &config)?;
    let new_records = load_records(new, &config)?;

    if key.is_empty() {
        info!("no composite key given, every new record matches the first old record");
    }
    if strict_keys {
        validate_composite_key(&old_records, &key)?;
        validate_composite_key(&new_records, &key)?;
    }

    let result = get_upsert_diff(&old_records, &new_records, &key);
    let summary = result.summary();

    println!("Old: {} records ({})", old_records.len(), old.display());
    println!("New: {} records ({})", new_records.len(), new.display());
    println!("Key: {}", key.join(", "));
    println!();
    println!("  added:   {}", summary.added);
    println!("  deleted: {}", summary.deleted);
    println!("  updated: {}", summary.updated);

    if let Some(path) = output {
        write_json(&result, path)?;
        println!();
        println!("Wrote diff to {}", path.display());
    }

    Ok(())
}

fn cmd_show(input: &Path, limit: Option<usize>, infer_types: bool) -> keyrec_core::Result<()> {
    let source = Source::load(input, infer_types)?;
    let table: Table = match source {
        Source::Table(table) => table,
        records => records.into_table(&KeyMapping::identity(), &Value::Null),
    };

    println!("File: {}", input.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    let row_limit = limit.unwrap_or(10);
    let preview = Table::new(
        table.header.clone(),
        table.rows.iter().take(row_limit).cloned().collect(),
    );
    print!("{}", csv_string(&preview)?);

    if table.row_count() > row_limit {
        println!("... ({} more rows)", table.row_count() - row_limit);
    }

    Ok(())
}

fn cmd_create_config(output: &Path) -> keyrec_core::Result<()> {
    let config = JobConfig::template();
    config.save(output)?;

    println!("Created job file: {}", output.display());
    println!();
    println!("Edit the file to describe your data, then run:");
    println!(
        "  keyrec to-records --input <table.csv> --config {}",
        output.display()
    );
    println!(
        "  keyrec diff --old <old.json> --new <new.json> --config {}",
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn test_to_table_passes_table_input_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "id,name\n1,Ann\n").unwrap();

        cmd_to_table(&input, None, Some("name".into()), true, &output).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "id,name\n1,Ann\n");
    }

    #[test]
    fn test_cli_parses_diff() {
        let cli = Cli::try_parse_from([
            "keyrec", "diff", "--old", "a.json", "--new", "b.json", "--key", "id,rev",
        ])
        .unwrap();
        match cli.command {
            Commands::Diff { key, strict_keys, .. } => {
                assert_eq!(key.as_deref(), Some("id,rev"));
                assert!(!strict_keys);
            }
            _ => panic!("expected diff"),
        }
    }

    #[test]
    fn test_cli_parses_mode() {
        let cli = Cli::try_parse_from([
            "keyrec", "project", "-i", "in.json", "-c", "job.json", "--mode", "Update",
        ])
        .unwrap();
        match cli.command {
            Commands::Project { mode, .. } => assert_eq!(mode, Some(ProjectionMode::Update)),
            _ => panic!("expected project"),
        }
    }

    #[test]
    fn test_diff_command_writes_result() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.csv");
        let new = dir.path().join("new.json");
        let out = dir.path().join("diff.json");
        std::fs::write(&old, "id,name\n1,Ann\n2,Bob\n").unwrap();
        std::fs::write(&new, r#"[{"id": "1", "name": "Ann"}, {"id": "3", "name": "Cy"}]"#).unwrap();

        cmd_diff(&old, &new, Some("id".into()), None, true, Some(out.as_path())).unwrap();

        let result: keyrec_core::ReconciliationResult =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(result.summary().added, 1);
        assert_eq!(result.summary().deleted, 1);
        assert_eq!(result.summary().updated, 0);
    }
}
