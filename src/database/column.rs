use crate::spreadsheet::cell::is_integral;
use crate::spreadsheet::RawCell;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to column type parsing.
#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("Invalid column type '{0}'")]
    TypeError(String),
}

/// Destination column types.
///
/// Ordered by the widening lattice `Boolean ⊏ Integer ⊏ Float ⊏ Text`; `DateTime` only
/// widens to `Text`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Boolean values (true/false)
    Boolean,
    /// 64-bit signed integers
    Integer,
    /// Double-precision floating point numbers
    Float,
    /// Date and time
    DateTime,
    /// Variable-length strings
    Text,
}

/// Pairs one source header with its destination identifier and type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header text exactly as found in the sheet
    pub original_name: String,
    /// Legal, table-unique identifier
    pub sanitized_name: String,
    pub column_type: ColumnType,
}

impl ColumnType {
    /// Parses a column type from a string representation.
    /// Supports various aliases for each type.
    pub fn parse(name: &str) -> Result<Self, ColumnError> {
        match name.to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" | "BIT" | "YESNO" => Ok(Self::Boolean),
            "INT" | "INTEGER" | "BIGINT" | "LONG" => Ok(Self::Integer),
            "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" => Ok(Self::Float),
            "DATETIME" | "TIMESTAMP" | "DATE" => Ok(Self::DateTime),
            "TEXT" | "STRING" | "VARCHAR" => Ok(Self::Text),
            _ => Err(ColumnError::TypeError(name.to_string())),
        }
    }

    /// Most specific type of a single cell; `None` for empty cells.
    /// Only native booleans classify as `Boolean`, numeric 0/1 stay `Integer`.
    pub fn of(cell: &RawCell) -> Option<Self> {
        match cell {
            RawCell::Empty => None,
            RawCell::Boolean(_) => Some(ColumnType::Boolean),
            RawCell::Integer(_) => Some(ColumnType::Integer),
            RawCell::Number(value) if is_integral(*value) => Some(ColumnType::Integer),
            RawCell::Number(_) => Some(ColumnType::Float),
            RawCell::DateTime(_) => Some(ColumnType::DateTime),
            RawCell::Text(_) => Some(ColumnType::Text),
        }
    }

    /// Nearest common ancestor of two types in the widening lattice.
    pub fn widen(self, other: ColumnType) -> ColumnType {
        match (self.numeric_rank(), other.numeric_rank()) {
            _ if self == other => self,
            (Some(left), Some(right)) if left >= right => self,
            (Some(_), Some(_)) => other,
            _ => ColumnType::Text,
        }
    }

    /// Position on the numeric chain, `None` for `DateTime` and `Text`.
    #[inline]
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            ColumnType::Boolean => Some(0),
            ColumnType::Integer => Some(1),
            ColumnType::Float => Some(2),
            _ => None,
        }
    }
}

impl FromStr for ColumnType {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Destination SQL type names for each [`ColumnType`].
///
/// Connectors supply their own map so DDL matches the destination's dialect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlTypeMap {
    pub boolean: String,
    pub integer: String,
    pub float: String,
    pub datetime: String,
    pub text: String,
}

impl SqlTypeMap {
    /// Plain ANSI-flavoured names: `INTEGER`, `DOUBLE`, `BOOLEAN`, `DATETIME`, `TEXT`.
    pub fn ansi() -> Self {
        Self {
            boolean: "BOOLEAN".to_owned(),
            integer: "INTEGER".to_owned(),
            float: "DOUBLE".to_owned(),
            datetime: "DATETIME".to_owned(),
            text: "TEXT".to_owned(),
        }
    }

    /// DuckDB names; integers are 64-bit to hold every spreadsheet whole number.
    pub fn duckdb() -> Self {
        Self {
            integer: "BIGINT".to_owned(),
            datetime: "TIMESTAMP".to_owned(),
            ..Self::ansi()
        }
    }

    pub fn sql_type(&self, kind: ColumnType) -> &str {
        match kind {
            ColumnType::Boolean => &self.boolean,
            ColumnType::Integer => &self.integer,
            ColumnType::Float => &self.float,
            ColumnType::DateTime => &self.datetime,
            ColumnType::Text => &self.text,
        }
    }
}

impl Default for SqlTypeMap {
    fn default() -> Self {
        Self::ansi()
    }
}
