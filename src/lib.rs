//! # Spreadsheet to DuckDB Loader
//!
//! Imports every worksheet of a spreadsheet workbook into its own table of an existing DuckDB
//! database, and records how each source column was renamed in a reserved `__column_map` table.
//!
//! ## Features
//!
//! - **Multi-format support**: Excel (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`) and
//!   OpenDocument (`.ods`) workbooks
//! - **Legal identifiers**: headers are sanitized into unique, length-limited column names, either
//!   shortened from the header text or assigned spreadsheet-style letter codes
//! - **Field type inference**: each column gets the narrowest of boolean, integer, float, datetime
//!   and text that fits all of its values, unless a glob override forces a type
//! - **Resilient loading**: cells that do not convert are stored as NULL, rows the database refuses
//!   are skipped and reported, and a failed bulk batch is retried row by row
//!
//! ## Example
//!
//! ```no_run
//! use sheet_loader::{open_workbook, DuckDbConnector, ImportConfig, Importer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workbook = open_workbook("sales.xlsx")?;
//! let mut connector = DuckDbConnector::open("sales.duckdb")?;
//! let report = Importer::new(ImportConfig::default()).run(&workbook, &mut connector)?;
//! println!("{} rows imported", report.rows_inserted());
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod database;
pub mod error;
pub mod import;
pub mod loader;
pub mod spreadsheet;

pub use config::ImportConfig;
pub use database::column::{ColumnType, SqlTypeMap};
pub use database::connector::{Connector, ConnectorError};
pub use database::duckdb_connector::DuckDbConnector;
pub use database::memory::MemoryConnector;
pub use database::naming::{NameComparison, NamingMode};
pub use error::{ImportError, ImportResult};
pub use import::Importer;
pub use loader::{ImportReport, RowIssue, RowIssueKind, TableReport};
pub use spreadsheet::{open_workbook, Workbook, Worksheet};
