//! # Batch Loader
//!
//! Creates one destination table from a [`TablePlan`] and streams the worksheet's data rows into
//! it in fixed-size batches. Cells are converted at insert time; cells that do not fit their
//! column become NULL and rows the destination refuses are skipped, both recorded in the
//! [`TableReport`].
pub mod report;
mod strategy;

pub use report::{ImportReport, RowIssue, RowIssueKind, TableReport};

use crate::config::ImportConfig;
use crate::database::connector::{Connector, CreateTable, InsertInto};
use crate::database::table::TablePlan;
use crate::database::value::{convert, SqlValue};
use crate::error::{ImportError, ImportResult};
use crate::spreadsheet::{RawCell, Worksheet};
use log::{debug, info, warn};
use strategy::{strategy_chain, InsertStrategy, PendingRow};

pub struct BatchLoader<'a> {
    config: &'a ImportConfig,
}

impl<'a> BatchLoader<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self { config }
    }

    /// Creates the planned table and inserts every data row of `worksheet`.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::Schema`] if the table cannot be created, and with
    /// [`ImportError::Schema`] or [`ImportError::Connection`] on an unrecoverable insert failure.
    /// Recoverable row failures never fail the call.
    pub fn load(
        &self,
        connector: &mut dyn Connector,
        plan: &TablePlan,
        worksheet: &Worksheet,
    ) -> ImportResult<TableReport> {
        let create = CreateTable::new(&plan.table_name, &plan.columns, &connector.type_map());
        connector
            .create_table(&create)
            .map_err(|e| ImportError::from_connector(&plan.table_name, e))?;
        debug!("Created table {} with {} columns", plan.table_name, plan.columns.len());

        let statement = InsertInto::new(&plan.table_name, &plan.columns);
        let strategies = strategy_chain(self.config.use_fast_executemany && connector.supports_bulk());
        let mut report = TableReport {
            sheet_name: plan.sheet_name.to_owned(),
            table_name: plan.table_name.to_owned(),
            ..Default::default()
        };

        let mut batch = Vec::with_capacity(self.config.insert_batch_size);
        let mut batch_number = 0;
        for (number, cells) in worksheet.data_rows() {
            if self.config.skip_empty_rows && cells.iter().all(RawCell::is_empty) {
                continue;
            }
            report.rows_read += 1;
            batch.push(self.convert_row(plan, number, cells, &mut report));
            if batch.len() >= self.config.insert_batch_size {
                batch_number += 1;
                self.flush(connector, &strategies, &statement, &batch, batch_number, &mut report)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            batch_number += 1;
            self.flush(connector, &strategies, &statement, &batch, batch_number, &mut report)?;
        }

        info!(
            "Loaded sheet '{}' into {}: {} of {} rows inserted, {} skipped, {} cells nulled",
            report.sheet_name,
            report.table_name,
            report.rows_inserted,
            report.rows_read,
            report.rows_skipped,
            report.nulled_cells()
        );
        Ok(report)
    }

    fn convert_row(
        &self,
        plan: &TablePlan,
        number: usize,
        cells: &[RawCell],
        report: &mut TableReport,
    ) -> PendingRow {
        const EMPTY: &RawCell = &RawCell::Empty;
        let values = plan
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let cell = cells.get(index).unwrap_or(EMPTY);
                convert(cell, column.column_type).unwrap_or_else(|message| {
                    let issue = RowIssue {
                        row: number,
                        column: Some(column.sanitized_name.to_owned()),
                        kind: RowIssueKind::Conversion,
                        message,
                    };
                    warn!("{}: {issue}", plan.table_name);
                    report.issues.push(issue);
                    SqlValue::Null
                })
            })
            .collect();
        PendingRow { number, values }
    }

    fn flush(
        &self,
        connector: &mut dyn Connector,
        strategies: &[Box<dyn InsertStrategy>],
        statement: &InsertInto,
        batch: &[PendingRow],
        batch_number: usize,
        report: &mut TableReport,
    ) -> ImportResult<()> {
        for (attempt, strategy) in strategies.iter().enumerate() {
            let last = attempt + 1 == strategies.len();
            match strategy.insert(connector, statement, batch) {
                Ok(outcome) => {
                    debug!(
                        "{} batch {batch_number}: {} rows inserted ({}), {} rejected",
                        statement.table,
                        outcome.inserted,
                        strategy.name(),
                        outcome.rejected.len()
                    );
                    report.rows_inserted += outcome.inserted;
                    report.rows_skipped += outcome.rejected.len();
                    for (row, message) in outcome.rejected {
                        let issue = RowIssue {
                            row,
                            column: None,
                            kind: RowIssueKind::Insert,
                            message,
                        };
                        warn!("{}: {issue}", statement.table);
                        report.issues.push(issue);
                    }
                    return Ok(());
                }
                // Only the last tier decides; any earlier failure degrades to the next one.
                Err(e) if !last => {
                    warn!(
                        "{} batch {batch_number}: {} insert failed, retrying: {e}",
                        statement.table,
                        strategy.name()
                    );
                    report.degraded_batches += 1;
                }
                Err(e) => return Err(ImportError::from_connector(&statement.table, e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::{ColumnSpec, ColumnType, SqlTypeMap};
    use crate::database::connector::ConnectorError;
    use crate::database::memory::MemoryConnector;

    fn text(value: &str) -> RawCell {
        RawCell::Text(value.to_owned())
    }

    fn plan() -> TablePlan {
        let column = |name: &str, column_type| ColumnSpec {
            original_name: name.to_owned(),
            sanitized_name: name.to_owned(),
            column_type,
        };
        TablePlan {
            sheet_name: "People".to_owned(),
            table_name: "People".to_owned(),
            columns: vec![column("id", ColumnType::Integer), column("born", ColumnType::DateTime)],
            mapping: Vec::new(),
        }
    }

    fn sheet(rows: usize) -> Worksheet {
        let mut cells = vec![vec![text("id"), text("born")]];
        for index in 0..rows {
            cells.push(vec![RawCell::Number(index as f64), text("2024-01-01")]);
        }
        Worksheet::new("People", cells)
    }

    /// Memory connector whose bulk path always fails and which refuses rows with a negative id.
    #[derive(Default)]
    struct Flaky {
        inner: MemoryConnector,
        bulk_calls: usize,
        /// Report bulk failures as schema errors instead of row errors
        bulk_schema_error: bool,
    }

    impl Connector for Flaky {
        fn create_table(&mut self, statement: &CreateTable) -> Result<(), ConnectorError> {
            self.inner.create_table(statement)
        }

        fn insert_row(&mut self, statement: &InsertInto, row: &[SqlValue]) -> Result<(), ConnectorError> {
            match row.first() {
                Some(SqlValue::Integer(id)) if *id < 0 => Err(ConnectorError::Row("negative id".to_owned())),
                _ => self.inner.insert_row(statement, row),
            }
        }

        fn insert_many(
            &mut self,
            _statement: &InsertInto,
            _rows: &[Vec<SqlValue>],
        ) -> Result<(), ConnectorError> {
            self.bulk_calls += 1;
            if self.bulk_schema_error {
                Err(ConnectorError::Schema("driver cannot bind bulk parameters".to_owned()))
            } else {
                Err(ConnectorError::Row("bulk refused".to_owned()))
            }
        }

        fn supports_bulk(&self) -> bool {
            true
        }

        fn list_tables(&mut self) -> Result<Vec<String>, ConnectorError> {
            self.inner.list_tables()
        }

        fn type_map(&self) -> SqlTypeMap {
            SqlTypeMap::ansi()
        }
    }

    #[test]
    fn failing_bulk_falls_back_to_rows() {
        let config = ImportConfig {
            use_fast_executemany: true,
            insert_batch_size: 2,
            ..Default::default()
        };
        let mut connector = Flaky::default();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &sheet(5)).unwrap();

        assert_eq!(connector.bulk_calls, 3);
        assert_eq!(report.degraded_batches, 3);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_inserted, 5);
        assert_eq!(connector.inner.table("People").unwrap().rows.len(), 5);
        assert_eq!(
            connector.inner.table("People").unwrap().columns[0],
            ("id".to_owned(), "INTEGER".to_owned())
        );
    }

    #[test]
    fn any_bulk_failure_falls_back_to_rows() {
        let config = ImportConfig {
            use_fast_executemany: true,
            ..Default::default()
        };
        let mut connector = Flaky {
            bulk_schema_error: true,
            ..Default::default()
        };
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &sheet(2)).unwrap();

        assert_eq!(connector.bulk_calls, 1);
        assert_eq!(report.degraded_batches, 1);
        assert_eq!(report.rows_inserted, 2);
        assert_eq!(connector.inner.table("People").unwrap().rows.len(), 2);
    }

    #[test]
    fn schema_error_in_last_tier_is_fatal() {
        let config = ImportConfig::default();
        let mut connector = MemoryConnector::new();
        connector
            .create_table(&CreateTable::new("People", &plan().columns, &SqlTypeMap::ansi()))
            .unwrap();

        // Statement names fewer columns than the table has.
        let statement = InsertInto::new("People", &plan().columns[..1]);
        let batch = vec![PendingRow {
            number: 2,
            values: vec![SqlValue::Integer(1)],
        }];
        let mut report = TableReport::default();
        let result = BatchLoader::new(&config).flush(
            &mut connector,
            &strategy_chain(false),
            &statement,
            &batch,
            1,
            &mut report,
        );
        assert!(matches!(result, Err(ImportError::Schema { table, .. }) if table == "People"));
        assert_eq!(report.rows_inserted, 0);
    }

    #[test]
    fn bulk_is_off_by_default() {
        let config = ImportConfig::default();
        let mut connector = Flaky::default();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &sheet(3)).unwrap();
        assert_eq!(connector.bulk_calls, 0);
        assert_eq!(report.degraded_batches, 0);
        assert_eq!(report.rows_inserted, 3);
    }

    #[test]
    fn rejected_rows_are_skipped_and_reported() {
        let config = ImportConfig::default();
        let mut worksheet = sheet(2);
        worksheet.rows.push(vec![RawCell::Number(-1.0), text("2024-01-01")]);
        worksheet.rows.push(vec![RawCell::Number(9.0)]);

        let mut connector = Flaky::default();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &worksheet).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_inserted, 3);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row, 4);
        assert_eq!(report.issues[0].kind, RowIssueKind::Insert);

        let born = connector.inner.table("People").unwrap().column("born").unwrap();
        assert_eq!(born[2], &SqlValue::Null);
    }

    #[test]
    fn unconvertible_cells_become_null() {
        let config = ImportConfig::default();
        let worksheet = Worksheet::new(
            "People",
            vec![
                vec![text("id"), text("born")],
                vec![RawCell::Number(1.0), text("not a date")],
            ],
        );
        let mut connector = MemoryConnector::new();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &worksheet).unwrap();

        assert_eq!(report.rows_inserted, 1);
        assert_eq!(report.nulled_cells(), 1);
        assert_eq!(report.issues[0].column.as_deref(), Some("born"));
        assert_eq!(
            connector.table("People").unwrap().rows[0],
            vec![SqlValue::Integer(1), SqlValue::Null]
        );
    }

    #[test]
    fn empty_rows_are_skipped_unless_kept() {
        let mut worksheet = sheet(1);
        worksheet.rows.push(vec![RawCell::Empty, RawCell::Empty]);

        let config = ImportConfig::default();
        let mut connector = MemoryConnector::new();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &worksheet).unwrap();
        assert_eq!(report.rows_read, 1);

        let config = ImportConfig {
            skip_empty_rows: false,
            ..Default::default()
        };
        let mut connector = MemoryConnector::new();
        let report = BatchLoader::new(&config).load(&mut connector, &plan(), &worksheet).unwrap();
        assert_eq!(report.rows_inserted, 2);
    }

    #[test]
    fn rejected_create_is_fatal() {
        let config = ImportConfig::default();
        let mut connector = MemoryConnector::new();
        let loader = BatchLoader::new(&config);
        loader.load(&mut connector, &plan(), &sheet(1)).unwrap();
        let result = loader.load(&mut connector, &plan(), &sheet(1));
        assert!(matches!(result, Err(ImportError::Schema { table, .. }) if table == "People"));
    }
}
