//! # Import Orchestration
//!
//! [`Importer::run`] drives a whole workbook into a destination: it plans every selected sheet,
//! checks that none of the planned tables already exists, loads the sheets one after another and
//! finally writes the reserved mapping table.
use crate::config::{ImportConfig, MAPPING_COLUMNS, MAPPING_TABLE};
use crate::database::connector::Connector;
use crate::database::naming::UsedNames;
use crate::database::table::{ColumnPlanner, MappingRow, TablePlan};
use crate::error::{ImportError, ImportResult, ResultMessage};
use crate::loader::{BatchLoader, ImportReport};
use crate::spreadsheet::{RawCell, Workbook, Worksheet};
use log::{info, warn};

pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Imports every selected sheet of `workbook` through `connector`.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, on a planned table name that already exists in the
    /// destination (before anything is written), and on any unrecoverable connector failure.
    /// Row-level problems are reported, not raised.
    pub fn run(&self, workbook: &Workbook, connector: &mut dyn Connector) -> ImportResult<ImportReport> {
        self.config.validate()?;

        let mut report = ImportReport::default();
        let plans = self.plan_sheets(workbook, &mut report.skipped_sheets);
        self.check_collisions(connector, &plans)?;

        let loader = BatchLoader::new(&self.config);
        let mut mapping = Vec::new();
        for (plan, worksheet) in &plans {
            info!(
                "Importing sheet '{}' as {} ({} columns)",
                plan.sheet_name,
                plan.table_name,
                plan.columns.len()
            );
            let table = loader
                .load(connector, plan, worksheet)
                .with_prefix(&format!("Sheet '{}'", plan.sheet_name))?;
            report.tables.push(table);
            mapping.extend(plan.mapping.iter().cloned());
        }

        let mapping_table = loader
            .load(connector, &TablePlan::mapping_table(), &mapping_sheet(&mapping))
            .with_prefix("Column mapping")?;
        report.mapping_rows = mapping_table.rows_inserted;
        info!(
            "Imported {} sheets, {} rows; {} mapping rows written to {MAPPING_TABLE}",
            report.tables.len(),
            report.rows_inserted(),
            report.mapping_rows
        );
        Ok(report)
    }

    /// Plans the selected sheets in workbook order. Sheets without columns are skipped.
    fn plan_sheets<'w>(
        &self,
        workbook: &'w Workbook,
        skipped: &mut Vec<String>,
    ) -> Vec<(TablePlan, &'w Worksheet)> {
        let planner = ColumnPlanner::new(&self.config);
        let mut table_names = planner.table_names();
        let mut plans = Vec::new();

        for worksheet in &workbook.sheets {
            if !self.config.includes_sheet(&worksheet.name) {
                info!("Sheet '{}' not selected", worksheet.name);
                continue;
            }
            let plan = planner.plan(worksheet, &table_names);
            if plan.is_empty() {
                warn!("Sheet '{}' has no header row, skipping", worksheet.name);
                skipped.push(worksheet.name.to_owned());
                continue;
            }
            table_names.insert(&plan.table_name);
            plans.push((plan, worksheet));
        }
        plans
    }

    /// Fails if a planned table, or the mapping table, already exists in the destination.
    fn check_collisions(
        &self,
        connector: &mut dyn Connector,
        plans: &[(TablePlan, &Worksheet)],
    ) -> ImportResult<()> {
        let existing = connector
            .list_tables()
            .map_err(|e| ImportError::from_connector(MAPPING_TABLE, e))?;
        let mut present = UsedNames::new(self.config.name_comparison);
        for name in &existing {
            present.insert(name);
        }

        let planned = plans
            .iter()
            .map(|(plan, _)| plan.table_name.as_str())
            .chain(std::iter::once(MAPPING_TABLE));
        for table in planned {
            if present.contains(table) {
                return Err(ImportError::Schema {
                    table: table.to_owned(),
                    message: "a table with this name already exists in the destination".to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Lays out mapping rows as a worksheet so they load like any other sheet.
fn mapping_sheet(rows: &[MappingRow]) -> Worksheet {
    let header = MAPPING_COLUMNS
        .iter()
        .map(|name| RawCell::Text((*name).to_owned()))
        .collect();
    let data = rows.iter().map(|row| {
        vec![
            RawCell::Text(row.table_name.to_owned()),
            RawCell::Text(row.original_name.to_owned()),
            RawCell::Text(row.sanitized_name.to_owned()),
        ]
    });
    Worksheet::new(MAPPING_TABLE, std::iter::once(header).chain(data).collect())
}
