use std::fmt;

/// What went wrong with a row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowIssueKind {
    /// A cell could not be converted and was stored as NULL
    Conversion,
    /// The destination rejected the row; it was skipped
    Insert,
}

impl RowIssueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RowIssueKind::Conversion => "conversion",
            RowIssueKind::Insert => "insert",
        }
    }
}

/// A recoverable problem with one row of one sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based sheet row number
    pub row: usize,
    /// Sanitized column name, when the problem is confined to one cell
    pub column: Option<String>,
    pub kind: RowIssueKind,
    pub message: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(
                f,
                "row {} column {column} ({}): {}",
                self.row,
                self.kind.as_str(),
                self.message
            ),
            None => write!(f, "row {} ({}): {}", self.row, self.kind.as_str(), self.message),
        }
    }
}

/// Outcome of loading one sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableReport {
    pub sheet_name: String,
    pub table_name: String,
    /// Data rows considered for insertion
    pub rows_read: usize,
    pub rows_inserted: usize,
    /// Rows rejected by the destination
    pub rows_skipped: usize,
    /// Bulk batches that had to be retried row-by-row
    pub degraded_batches: usize,
    pub issues: Vec<RowIssue>,
}

impl TableReport {
    /// Number of cells stored as NULL because they could not be converted.
    pub fn nulled_cells(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.kind == RowIssueKind::Conversion)
            .count()
    }
}

/// Outcome of a whole import run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// One report per imported sheet, in workbook order
    pub tables: Vec<TableReport>,
    /// Rows written to the mapping table
    pub mapping_rows: usize,
    /// Sheets left out because they had no header
    pub skipped_sheets: Vec<String>,
}

impl ImportReport {
    pub fn rows_inserted(&self) -> usize {
        self.tables.iter().map(|table| table.rows_inserted).sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.tables.iter().map(|table| table.rows_skipped).sum()
    }

    pub fn nulled_cells(&self) -> usize {
        self.tables.iter().map(TableReport::nulled_cells).sum()
    }
}
