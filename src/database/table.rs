use crate::config::{ImportConfig, MAPPING_COLUMNS, MAPPING_TABLE};
use crate::database::column::{ColumnSpec, ColumnType};
use crate::database::inference::infer;
use crate::database::naming::{NameSanitizer, NamingMode, UsedNames};
use crate::spreadsheet::Worksheet;

/// One `__column_map` entry: where a source column ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingRow {
    pub table_name: String,
    pub original_name: String,
    pub sanitized_name: String,
}

/// Destination layout for one worksheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TablePlan {
    /// Source sheet name
    pub sheet_name: String,
    /// Sanitized, workbook-unique table name
    pub table_name: String,
    /// Column definitions, in header order
    pub columns: Vec<ColumnSpec>,
    /// One entry per column, in header order
    pub mapping: Vec<MappingRow>,
}

impl TablePlan {
    /// Layout of the reserved mapping table. Its names are fixed, never sanitized.
    pub fn mapping_table() -> Self {
        Self {
            sheet_name: MAPPING_TABLE.to_owned(),
            table_name: MAPPING_TABLE.to_owned(),
            columns: MAPPING_COLUMNS
                .iter()
                .map(|name| ColumnSpec {
                    original_name: (*name).to_owned(),
                    sanitized_name: (*name).to_owned(),
                    column_type: ColumnType::Text,
                })
                .collect(),
            mapping: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Derives table plans from worksheets.
pub struct ColumnPlanner<'a> {
    config: &'a ImportConfig,
    columns: NameSanitizer,
    tables: NameSanitizer,
}

impl<'a> ColumnPlanner<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self {
            config,
            columns: NameSanitizer::new(config.max_colname_len, config.naming_mode),
            // Letter codes would make meaningless table names.
            tables: NameSanitizer::new(config.max_colname_len, NamingMode::Short),
        }
    }

    /// Workbook-scoped table name registry, with the reserved mapping table pre-registered.
    pub fn table_names(&self) -> UsedNames {
        let mut used = UsedNames::new(self.config.name_comparison);
        used.insert(MAPPING_TABLE);
        used
    }

    /// Plans one worksheet. `table_names` is only read; the caller records the chosen table name.
    ///
    /// Planning the same sheet against the same registry always gives the same plan.
    pub fn plan(&self, worksheet: &Worksheet, table_names: &UsedNames) -> TablePlan {
        let table_name = self.tables.sanitize(&worksheet.name, table_names);
        let mut used = UsedNames::new(self.config.name_comparison);
        let mut columns = Vec::with_capacity(worksheet.column_count());
        let mut mapping = Vec::with_capacity(worksheet.column_count());

        for (index, header) in worksheet.header().unwrap_or_default().iter().enumerate() {
            let original_name = header.to_text();
            let sanitized_name = self.columns.sanitize(&original_name, &used);
            used.insert(&sanitized_name);
            let column_type = self
                .config
                .column_type_override(&original_name)
                .unwrap_or_else(|| infer(worksheet.column(index)));

            mapping.push(MappingRow {
                table_name: table_name.to_owned(),
                original_name: original_name.to_owned(),
                sanitized_name: sanitized_name.to_owned(),
            });
            columns.push(ColumnSpec {
                original_name,
                sanitized_name,
                column_type,
            });
        }

        TablePlan {
            sheet_name: worksheet.name.to_owned(),
            table_name,
            columns,
            mapping,
        }
    }
}
