//! # sheet_loader
//!
//! Command-line entry point: `sheet_loader <INPUT> <DATABASE> [OPTIONS]`.
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::error;
use sheet_loader::config::{INSERT_BATCH_SIZE, MAX_COLNAME_LEN};
use sheet_loader::{
    open_workbook, DuckDbConnector, ImportConfig, ImportError, ImportReport, Importer, MemoryConnector,
    NameComparison, NamingMode,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Import every worksheet of a workbook into tables of an existing DuckDB database
#[derive(Parser)]
#[command(name = "sheet_loader")]
#[command(author, version, long_about = None)]
struct Cli {
    /// Workbook to import (.xlsx, .xlsm, .xlsb, .xls, .ods, ...)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Existing DuckDB database file
    #[arg(value_name = "DATABASE")]
    database: PathBuf,

    /// Column naming mode (short, letters)
    #[arg(long, default_value = "short")]
    naming_mode: NamingMode,

    /// Maximum length of generated identifiers
    #[arg(long, default_value_t = MAX_COLNAME_LEN)]
    max_colname_len: usize,

    /// Rows per insert batch
    #[arg(long, default_value_t = INSERT_BATCH_SIZE)]
    batch_size: usize,

    /// Insert each batch as one transaction, falling back to row-by-row on failure
    #[arg(long)]
    fast_executemany: bool,

    /// Treat identifiers differing only in case as distinct
    #[arg(long)]
    case_sensitive: bool,

    /// Force the type of columns whose header matches a glob (e.g. 'Date*=datetime')
    #[arg(long = "column-type", value_name = "PATTERN=TYPE")]
    column_types: Vec<String>,

    /// Only import sheets whose name matches a glob
    #[arg(long = "sheet", value_name = "PATTERN")]
    sheets: Vec<String>,

    /// Keep data rows whose cells are all empty
    #[arg(long)]
    keep_empty_rows: bool,

    /// Import into memory only; the database is not touched
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> Result<ImportConfig, ImportError> {
        let column_types = self
            .column_types
            .iter()
            .map(|value| ImportConfig::parse_column_type(value))
            .collect::<Result<Vec<_>, _>>()?;
        let sheet_patterns = if self.sheets.is_empty() {
            None
        } else {
            Some(
                self.sheets
                    .iter()
                    .map(|value| ImportConfig::parse_sheet_pattern(value))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
        let config = ImportConfig {
            max_colname_len: self.max_colname_len,
            naming_mode: self.naming_mode,
            name_comparison: if self.case_sensitive {
                NameComparison::CaseSensitive
            } else {
                NameComparison::CaseInsensitive
            },
            insert_batch_size: self.batch_size,
            use_fast_executemany: self.fast_executemany,
            column_types,
            sheet_patterns,
            skip_empty_rows: !self.keep_empty_rows,
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(report) => {
            print_summary(&report, cli.dry_run);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            if let Some(hint) = e.downcast_ref::<ImportError>().and_then(ImportError::hint) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ImportReport> {
    let config = cli.to_config()?;
    if !cli.input.is_file() {
        return Err(ImportError::Config(format!("input workbook '{}' not found", cli.input.display())).into());
    }
    let workbook = open_workbook(&cli.input)
        .map_err(ImportError::from)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let importer = Importer::new(config);
    let report = if cli.dry_run {
        importer.run(&workbook, &mut MemoryConnector::new())?
    } else {
        let mut connector = DuckDbConnector::open(&cli.database)?;
        importer
            .run(&workbook, &mut connector)
            .with_context(|| format!("Failed to import into {}", cli.database.display()))?
    };
    Ok(report)
}

fn print_summary(report: &ImportReport, dry_run: bool) {
    for table in &report.tables {
        println!(
            "{} -> {}: {} rows inserted, {} skipped, {} cells nulled",
            table.sheet_name,
            table.table_name,
            table.rows_inserted,
            table.rows_skipped,
            table.nulled_cells()
        );
    }
    for sheet in &report.skipped_sheets {
        println!("{sheet}: skipped (no header row)");
    }
    println!(
        "{}{} tables, {} rows inserted, {} rows skipped, {} cells nulled, {} mapping rows",
        if dry_run { "[dry run] " } else { "" },
        report.tables.len(),
        report.rows_inserted(),
        report.rows_skipped(),
        report.nulled_cells(),
        report.mapping_rows
    );
}
