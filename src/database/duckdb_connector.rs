//! DuckDB destination.
use crate::database::column::SqlTypeMap;
use crate::database::connector::{Connector, ConnectorError, CreateTable, InsertInto};
use crate::database::value::SqlValue;
use crate::error::{ImportError, ImportResult};
use duckdb::params_from_iter;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::path::Path;

/// Connector writing into an existing DuckDB database file.
///
/// Statement preparation failures are schema errors; failures while executing a prepared
/// insert are row errors. The connection closes when the connector is dropped.
pub struct DuckDbConnector {
    connection: Connection,
}

impl DuckDbConnector {
    /// Opens an existing database file. Unlike `Connection::open`, never creates one.
    pub fn open<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ImportError::Connection {
                message: format!("database '{}' not found", path.display()),
                hint: Some(
                    "create an empty database first, e.g. `duckdb <file> \"SELECT 1\"`, then re-run"
                        .to_owned(),
                ),
            });
        }
        let connection = Connection::open(path).map_err(|e| ImportError::Connection {
            message: format!("cannot open '{}': {e}", path.display()),
            hint: Some(
                "make sure the file is a DuckDB database and is not open in another process".to_owned(),
            ),
        })?;
        Ok(Self { connection })
    }

    /// Wraps an already open connection.
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }
}

/// Binds a converted value as a DuckDB value.
fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Boolean(value) => Value::Boolean(*value),
        SqlValue::Integer(value) => Value::BigInt(*value),
        SqlValue::Float(value) => Value::Double(*value),
        SqlValue::DateTime(value) => {
            Value::Timestamp(TimeUnit::Microsecond, value.and_utc().timestamp_micros())
        }
        SqlValue::Text(value) => Value::Text(value.to_owned()),
    }
}

impl Connector for DuckDbConnector {
    fn create_table(&mut self, statement: &CreateTable) -> Result<(), ConnectorError> {
        self.connection
            .execute_batch(&statement.to_sql())
            .map_err(|e| ConnectorError::Schema(e.to_string()))
    }

    fn insert_row(&mut self, statement: &InsertInto, row: &[SqlValue]) -> Result<(), ConnectorError> {
        let mut prepared = self
            .connection
            .prepare_cached(&statement.to_sql())
            .map_err(|e| ConnectorError::Schema(e.to_string()))?;
        prepared
            .execute(params_from_iter(row.iter().map(to_duckdb_value)))
            .map_err(|e| ConnectorError::Row(e.to_string()))?;
        Ok(())
    }

    /// Inserts the batch inside one transaction; any failing row rolls back the whole batch.
    fn insert_many(&mut self, statement: &InsertInto, rows: &[Vec<SqlValue>]) -> Result<(), ConnectorError> {
        let transaction = self
            .connection
            .transaction()
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        {
            let mut prepared = transaction
                .prepare(&statement.to_sql())
                .map_err(|e| ConnectorError::Schema(e.to_string()))?;
            for row in rows {
                prepared
                    .execute(params_from_iter(row.iter().map(to_duckdb_value)))
                    .map_err(|e| ConnectorError::Row(e.to_string()))?;
            }
        }
        transaction
            .commit()
            .map_err(|e| ConnectorError::Row(e.to_string()))
    }

    fn supports_bulk(&self) -> bool {
        true
    }

    fn list_tables(&mut self) -> Result<Vec<String>, ConnectorError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'main' ORDER BY table_name",
            )
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ConnectorError::Connection(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        Ok(names)
    }

    fn type_map(&self) -> SqlTypeMap {
        SqlTypeMap::duckdb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn connector() -> DuckDbConnector {
        DuckDbConnector::from_connection(Connection::open_in_memory().unwrap())
    }

    fn create(connector: &mut DuckDbConnector) {
        connector
            .create_table(&CreateTable {
                table: "People".to_owned(),
                columns: vec![
                    ("id".to_owned(), "BIGINT NOT NULL".to_owned()),
                    ("born".to_owned(), "TIMESTAMP".to_owned()),
                ],
            })
            .unwrap();
    }

    fn insert() -> InsertInto {
        InsertInto {
            table: "People".to_owned(),
            columns: vec!["id".to_owned(), "born".to_owned()],
        }
    }

    fn count(connector: &DuckDbConnector) -> i64 {
        connector
            .connection
            .query_row("SELECT count(*) FROM \"People\"", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn missing_file_is_connection_error() {
        let result = DuckDbConnector::open("/definitely/not/here.duckdb");
        match result {
            Err(error @ ImportError::Connection { .. }) => assert!(error.hint().is_some()),
            _ => panic!("expected a connection error"),
        }
    }

    #[test]
    fn creates_lists_and_inserts() {
        let mut connector = connector();
        create(&mut connector);
        assert_eq!(connector.list_tables().unwrap(), vec!["People".to_owned()]);

        let born = NaiveDate::from_ymd_opt(1815, 12, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        connector
            .insert_row(&insert(), &[SqlValue::Integer(1), SqlValue::DateTime(born)])
            .unwrap();
        assert_eq!(count(&connector), 1);
    }

    #[test]
    fn duplicate_table_is_schema_error() {
        let mut connector = connector();
        create(&mut connector);
        let result = connector.create_table(&CreateTable {
            table: "people".to_owned(),
            columns: vec![("id".to_owned(), "BIGINT".to_owned())],
        });
        assert!(matches!(result, Err(ConnectorError::Schema(_))));
    }

    #[test]
    fn constraint_violation_is_row_error() {
        let mut connector = connector();
        create(&mut connector);
        let result = connector.insert_row(&insert(), &[SqlValue::Null, SqlValue::Null]);
        assert!(matches!(result, Err(ConnectorError::Row(_))));
    }

    #[test]
    fn failing_bulk_batch_rolls_back() {
        let mut connector = connector();
        create(&mut connector);
        let rows = vec![
            vec![SqlValue::Integer(1), SqlValue::Null],
            vec![SqlValue::Null, SqlValue::Null],
        ];
        assert!(connector.insert_many(&insert(), &rows).is_err());
        assert_eq!(count(&connector), 0);

        connector.insert_many(&insert(), &rows[..1]).unwrap();
        assert_eq!(count(&connector), 1);
    }
}
