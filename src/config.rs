//! Import settings.
//!
//! Every component receives an [`ImportConfig`] explicitly; the constants below are only the
//! defaults it starts from.
use crate::database::column::ColumnType;
use crate::database::naming::{NameComparison, NamingMode};
use crate::error::{ImportError, ImportResult};
use glob::Pattern;

/// Identifier length ceiling applied to sanitized column and table names.
pub const MAX_COLNAME_LEN: usize = 30;

/// Hard identifier ceiling of the destination; the reserved mapping table is only checked against this.
pub const IDENTIFIER_HARD_LIMIT: usize = 64;

/// Shortest ceiling that still leaves room for a `_N` disambiguation suffix.
pub const MIN_COLNAME_LEN: usize = 4;

/// Column naming mode used when none is configured.
pub const NAMING_MODE: NamingMode = NamingMode::Short;

/// Rows per insert batch.
pub const INSERT_BATCH_SIZE: usize = 300;

/// Bulk inserts are off by default; row-by-row is the stable path.
pub const USE_FAST_EXECUTEMANY: bool = false;

/// Reserved table receiving one row per source column.
pub const MAPPING_TABLE: &str = "__column_map";

/// Columns of [`MAPPING_TABLE`], in order.
pub const MAPPING_COLUMNS: [&str; 3] = ["table_name", "original_name", "short_name"];

/// Settings for one import run.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    /// Ceiling for sanitized identifiers
    pub max_colname_len: usize,
    /// How column identifiers are derived from headers
    pub naming_mode: NamingMode,
    /// How the destination compares identifiers
    pub name_comparison: NameComparison,
    /// Rows per insert batch
    pub insert_batch_size: usize,
    /// Try a single bulk statement per batch before falling back to row-by-row
    pub use_fast_executemany: bool,
    /// Forced column types, matched in order against the original header
    pub column_types: Vec<(Pattern, ColumnType)>,
    /// Only import sheets whose name matches one of these patterns
    pub sheet_patterns: Option<Vec<Pattern>>,
    /// Drop data rows whose cells are all empty
    pub skip_empty_rows: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_colname_len: MAX_COLNAME_LEN,
            naming_mode: NAMING_MODE,
            name_comparison: NameComparison::CaseInsensitive,
            insert_batch_size: INSERT_BATCH_SIZE,
            use_fast_executemany: USE_FAST_EXECUTEMANY,
            column_types: Vec::new(),
            sheet_patterns: None,
            skip_empty_rows: true,
        }
    }
}

impl ImportConfig {
    /// Rejects settings no component can honor.
    pub fn validate(&self) -> ImportResult<()> {
        if !(MIN_COLNAME_LEN..=IDENTIFIER_HARD_LIMIT).contains(&self.max_colname_len) {
            return Err(ImportError::Config(format!(
                "max column name length must be between {MIN_COLNAME_LEN} and \
                 {IDENTIFIER_HARD_LIMIT}, got {}",
                self.max_colname_len
            )));
        }
        if self.insert_batch_size == 0 {
            return Err(ImportError::Config("insert batch size must be positive".to_owned()));
        }
        if MAPPING_TABLE.len() > IDENTIFIER_HARD_LIMIT
            || MAPPING_COLUMNS.iter().any(|column| column.len() > IDENTIFIER_HARD_LIMIT)
        {
            return Err(ImportError::Config(format!(
                "reserved table '{MAPPING_TABLE}' exceeds the identifier limit"
            )));
        }
        Ok(())
    }

    /// Parses a `PATTERN=TYPE` column type override, e.g. `Date*=datetime`.
    pub fn parse_column_type(value: &str) -> ImportResult<(Pattern, ColumnType)> {
        let (pattern, kind) = value.rsplit_once('=').ok_or_else(|| {
            ImportError::Config(format!("'{value}' is not a PATTERN=TYPE column type"))
        })?;
        let pattern = Pattern::new(pattern.trim())
            .map_err(|e| ImportError::Config(format!("invalid column pattern '{pattern}': {e}")))?;
        let kind = ColumnType::parse(kind.trim()).map_err(|e| ImportError::Config(e.to_string()))?;
        Ok((pattern, kind))
    }

    /// Parses a sheet selection glob.
    pub fn parse_sheet_pattern(value: &str) -> ImportResult<Pattern> {
        Pattern::new(value)
            .map_err(|e| ImportError::Config(format!("invalid sheet pattern '{value}': {e}")))
    }

    /// Forced type for a header, if any override matches it.
    pub fn column_type_override(&self, header: &str) -> Option<ColumnType> {
        self.column_types
            .iter()
            .find(|(pattern, _)| pattern.matches(header))
            .map(|(_, kind)| *kind)
    }

    /// Returns true if the sheet passes the configured selection.
    pub fn includes_sheet(&self, name: &str) -> bool {
        self.sheet_patterns
            .as_ref()
            .map(|patterns| patterns.iter().any(|pattern| pattern.matches(name)))
            .unwrap_or(true)
    }
}
