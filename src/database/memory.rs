//! In-memory destination, used for dry runs.
use crate::database::column::SqlTypeMap;
use crate::database::connector::{Connector, ConnectorError, CreateTable, InsertInto};
use crate::database::value::SqlValue;
use std::collections::BTreeMap;

/// A table held by [`MemoryConnector`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryTable {
    pub name: String,
    /// `(column, SQL type)` pairs as created
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl MemoryTable {
    /// Values of one column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<Vec<&SqlValue>> {
        let index = self
            .columns
            .iter()
            .position(|(column, _)| column.eq_ignore_ascii_case(name))?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

/// Connector keeping tables in memory. Table names compare case-insensitively, like DuckDB.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    fn target(&mut self, statement: &InsertInto) -> Result<&mut MemoryTable, ConnectorError> {
        let table = self
            .tables
            .get_mut(&statement.table.to_ascii_lowercase())
            .ok_or_else(|| ConnectorError::Schema(format!("table '{}' does not exist", statement.table)))?;
        if statement.columns.len() != table.columns.len() {
            return Err(ConnectorError::Schema(format!(
                "table '{}' has {} columns, statement names {}",
                table.name,
                table.columns.len(),
                statement.columns.len()
            )));
        }
        Ok(table)
    }
}

/// Rejects rows whose width does not match the statement.
fn check_row(statement: &InsertInto, row: &[SqlValue]) -> Result<(), ConnectorError> {
    if row.len() == statement.columns.len() {
        Ok(())
    } else {
        Err(ConnectorError::Row(format!(
            "expected {} values, got {}",
            statement.columns.len(),
            row.len()
        )))
    }
}

impl Connector for MemoryConnector {
    fn create_table(&mut self, statement: &CreateTable) -> Result<(), ConnectorError> {
        let key = statement.table.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(ConnectorError::Schema(format!(
                "table '{}' already exists",
                statement.table
            )));
        }
        if statement.columns.is_empty() {
            return Err(ConnectorError::Schema(format!(
                "table '{}' has no columns",
                statement.table
            )));
        }
        self.tables.insert(
            key,
            MemoryTable {
                name: statement.table.to_owned(),
                columns: statement.columns.to_owned(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn insert_row(&mut self, statement: &InsertInto, row: &[SqlValue]) -> Result<(), ConnectorError> {
        check_row(statement, row)?;
        self.target(statement)?.rows.push(row.to_vec());
        Ok(())
    }

    fn insert_many(&mut self, statement: &InsertInto, rows: &[Vec<SqlValue>]) -> Result<(), ConnectorError> {
        for row in rows {
            check_row(statement, row)?;
        }
        self.target(statement)?.rows.extend(rows.iter().cloned());
        Ok(())
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn list_tables(&mut self) -> Result<Vec<String>, ConnectorError> {
        Ok(self.tables.values().map(|table| table.name.to_owned()).collect())
    }

    fn type_map(&self) -> SqlTypeMap {
        SqlTypeMap::duckdb()
    }
}
