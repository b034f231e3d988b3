use crate::database::connector::ConnectorError;
use crate::spreadsheet::SpreadsheetError;
use thiserror::Error;

/// Convenience result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Fatal errors of an import run.
/// Row-level problems never surface here; they are collected as [`crate::loader::RowIssue`]s.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Bad arguments or settings, missing input file
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Destination missing, locked or unusable
    #[error("Database connection failed: {message}")]
    Connection {
        message: String,
        hint: Option<String>,
    },

    /// A table could not be created, or its name is already taken
    #[error("Table '{table}' rejected: {message}")]
    Schema { table: String, message: String },

    #[error("{0}")]
    Spreadsheet(#[from] SpreadsheetError),
}

impl ImportError {
    /// Classifies a connector failure that stopped work on `table`.
    pub(crate) fn from_connector(table: &str, error: ConnectorError) -> Self {
        match error {
            ConnectorError::Connection(message) => ImportError::Connection {
                message,
                hint: None,
            },
            other => ImportError::Schema {
                table: table.to_owned(),
                message: other.to_string(),
            },
        }
    }

    /// Remediation hint to show the operator, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            ImportError::Connection { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for ImportResult<T> {
    /// Prefixes schema and configuration messages with where they happened.
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| match e {
            ImportError::Schema { table, message: inner } => ImportError::Schema {
                table,
                message: format!("{message}: {inner}"),
            },
            ImportError::Config(inner) => ImportError::Config(format!("{message}: {inner}")),
            other => other,
        })
    }
}
