//! # Database Connector
//!
//! The destination database is reached only through the [`Connector`] trait. Statements are
//! passed as small structs that render to SQL, so a connector can either execute the SQL text
//! or work with the structure directly.
use crate::database::column::{ColumnSpec, SqlTypeMap};
use crate::database::value::SqlValue;
use thiserror::Error;

/// Errors reported by a connector.
///
/// Only [`ConnectorError::Row`] is recoverable: the offending row can be skipped and the
/// import continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    /// Malformed statement or schema problem (missing/duplicate table, bad column)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Constraint or data problem confined to the rows being inserted
    #[error("Row rejected: {0}")]
    Row(String),

    /// The connection itself is unusable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connector does not implement the requested operation
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl ConnectorError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConnectorError::Row(_))
    }
}

/// Quotes an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A `CREATE TABLE` statement: table name plus `(column, SQL type)` pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<(String, String)>,
}

impl CreateTable {
    /// Builds the statement for a plan, resolving SQL types through `types`.
    pub fn new(table: &str, columns: &[ColumnSpec], types: &SqlTypeMap) -> Self {
        Self {
            table: table.to_owned(),
            columns: columns
                .iter()
                .map(|column| {
                    (
                        column.sanitized_name.to_owned(),
                        types.sql_type(column.column_type).to_owned(),
                    )
                })
                .collect(),
        }
    }

    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|(name, kind)| format!("{} {kind}", quote_identifier(name)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({columns})", quote_identifier(&self.table))
    }
}

/// A parameterized `INSERT INTO` statement with one `?` per column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertInto {
    pub table: String,
    pub columns: Vec<String>,
}

impl InsertInto {
    pub fn new(table: &str, columns: &[ColumnSpec]) -> Self {
        Self {
            table: table.to_owned(),
            columns: columns
                .iter()
                .map(|column| column.sanitized_name.to_owned())
                .collect(),
        }
    }

    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|name| quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_identifier(&self.table)
        )
    }
}

/// The destination database collaborator.
///
/// Implementations are used by a single caller at a time and must tell schema-level failures
/// ([`ConnectorError::Schema`]) apart from row-level ones ([`ConnectorError::Row`]).
pub trait Connector {
    /// Creates a table; fails if it already exists.
    fn create_table(&mut self, statement: &CreateTable) -> Result<(), ConnectorError>;

    /// Inserts a single row.
    fn insert_row(&mut self, statement: &InsertInto, row: &[SqlValue]) -> Result<(), ConnectorError>;

    /// Inserts many rows as one unit; either every row is stored or none is.
    fn insert_many(
        &mut self,
        _statement: &InsertInto,
        _rows: &[Vec<SqlValue>],
    ) -> Result<(), ConnectorError> {
        Err(ConnectorError::Unsupported("bulk insert"))
    }

    /// Returns true if [`Connector::insert_many`] is implemented.
    fn supports_bulk(&self) -> bool {
        false
    }

    /// Names of the tables already present.
    fn list_tables(&mut self) -> Result<Vec<String>, ConnectorError>;

    /// SQL type names used when creating tables.
    fn type_map(&self) -> SqlTypeMap {
        SqlTypeMap::ansi()
    }
}
