use crate::database::connector::{Connector, ConnectorError, InsertInto};
use crate::database::value::SqlValue;

/// A converted data row waiting to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingRow {
    /// 1-based sheet row number
    pub number: usize,
    pub values: Vec<SqlValue>,
}

/// Result of inserting one batch.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct BatchOutcome {
    pub inserted: usize,
    /// `(sheet row number, reason)` for every row the destination refused
    pub rejected: Vec<(usize, String)>,
}

/// One way of pushing a batch into the destination.
///
/// An `Err` means the batch as a whole was not stored; a recoverable error lets the loader
/// fall through to the next strategy.
pub(crate) trait InsertStrategy {
    fn name(&self) -> &'static str;

    fn insert(
        &self,
        connector: &mut dyn Connector,
        statement: &InsertInto,
        batch: &[PendingRow],
    ) -> Result<BatchOutcome, ConnectorError>;
}

/// Sends the whole batch as one unit.
pub(crate) struct BulkInsert;

impl InsertStrategy for BulkInsert {
    fn name(&self) -> &'static str {
        "bulk"
    }

    fn insert(
        &self,
        connector: &mut dyn Connector,
        statement: &InsertInto,
        batch: &[PendingRow],
    ) -> Result<BatchOutcome, ConnectorError> {
        let rows: Vec<Vec<SqlValue>> = batch.iter().map(|row| row.values.to_owned()).collect();
        connector.insert_many(statement, &rows)?;
        Ok(BatchOutcome {
            inserted: batch.len(),
            rejected: Vec::new(),
        })
    }
}

/// Inserts rows one at a time, skipping rows the destination refuses.
pub(crate) struct RowByRowInsert;

impl InsertStrategy for RowByRowInsert {
    fn name(&self) -> &'static str {
        "row-by-row"
    }

    fn insert(
        &self,
        connector: &mut dyn Connector,
        statement: &InsertInto,
        batch: &[PendingRow],
    ) -> Result<BatchOutcome, ConnectorError> {
        let mut outcome = BatchOutcome::default();
        for row in batch {
            match connector.insert_row(statement, &row.values) {
                Ok(()) => outcome.inserted += 1,
                Err(e) if e.is_recoverable() => outcome.rejected.push((row.number, e.to_string())),
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

/// Strategies to try for each batch, in order. Row-by-row always comes last.
pub(crate) fn strategy_chain(use_bulk: bool) -> Vec<Box<dyn InsertStrategy>> {
    let mut chain: Vec<Box<dyn InsertStrategy>> = Vec::with_capacity(2);
    if use_bulk {
        chain.push(Box::new(BulkInsert));
    }
    chain.push(Box::new(RowByRowInsert));
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connector::CreateTable;
    use crate::database::memory::MemoryConnector;

    fn setup() -> (MemoryConnector, InsertInto) {
        let mut connector = MemoryConnector::new();
        connector
            .create_table(&CreateTable {
                table: "T".to_owned(),
                columns: vec![("a".to_owned(), "BIGINT".to_owned())],
            })
            .unwrap();
        let statement = InsertInto {
            table: "T".to_owned(),
            columns: vec!["a".to_owned()],
        };
        (connector, statement)
    }

    fn rows() -> Vec<PendingRow> {
        vec![
            PendingRow {
                number: 2,
                values: vec![SqlValue::Integer(1)],
            },
            PendingRow {
                number: 3,
                values: vec![],
            },
            PendingRow {
                number: 4,
                values: vec![SqlValue::Integer(3)],
            },
        ]
    }

    #[test]
    fn row_by_row_skips_rejected_rows() {
        let (mut connector, statement) = setup();
        let outcome = RowByRowInsert.insert(&mut connector, &statement, &rows()).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, 3);
        assert_eq!(connector.table("T").unwrap().rows.len(), 2);
    }

    #[test]
    fn bulk_fails_as_a_unit() {
        let (mut connector, statement) = setup();
        let result = BulkInsert.insert(&mut connector, &statement, &rows());
        assert!(matches!(result, Err(ConnectorError::Row(_))));
        assert!(connector.table("T").unwrap().rows.is_empty());
    }

    #[test]
    fn chain_order() {
        let names: Vec<&str> = strategy_chain(true).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["bulk", "row-by-row"]);
        let names: Vec<&str> = strategy_chain(false).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["row-by-row"]);
    }
}
