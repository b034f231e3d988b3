//! # Spreadsheet Module
//!
//! Reads a workbook (`.xlsx`, `.xlsm`, `.xlam`, `.xlsb`, `.xls`, `.xla`, `.ods`) into memory as
//! ordered worksheets of [`RawCell`] grids. The file handle is released as soon as every sheet
//! has been read.
pub mod cell;

pub use cell::RawCell;

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    /// The workbook could not be opened or parsed
    #[error("Cannot open workbook '{name}': {source}")]
    OpenError {
        name: String,
        #[source]
        source: calamine::Error,
    },

    /// A sheet listed by the workbook could not be read
    #[error("Cannot read sheet '{sheet}': {source}")]
    SheetError {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    /// The workbook has no sheets at all
    #[error("Workbook '{name}' contains no sheets")]
    NoSheets { name: String },
}

/// One worksheet: its name and a header-first grid of cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Worksheet {
    /// Sheet name as shown in the workbook
    pub name: String,
    /// 0-based sheet row index of the header row
    pub header_row: usize,
    /// Header row followed by data rows
    pub rows: Vec<Vec<RawCell>>,
}

impl Worksheet {
    pub fn new(name: &str, rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            name: name.to_owned(),
            header_row: 0,
            rows,
        }
    }

    /// Builds a worksheet from a calamine range, using the first non-empty row as header.
    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let rows: Vec<Vec<RawCell>> = range
            .rows()
            .map(|row| row.iter().map(RawCell::from).collect())
            .collect();
        let skipped = rows
            .iter()
            .take_while(|row| row.iter().all(RawCell::is_empty))
            .count();
        let rows = rows.into_iter().skip(skipped).collect();
        Self {
            name: name.to_owned(),
            header_row: start_row + skipped,
            rows,
        }
    }

    /// Header cells, if the sheet has any row at all.
    pub fn header(&self) -> Option<&[RawCell]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Number of columns declared by the header row.
    pub fn column_count(&self) -> usize {
        self.header().map(<[RawCell]>::len).unwrap_or(0)
    }

    /// Data rows paired with their 1-based sheet row number.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[RawCell])> + '_ {
        let first = self.header_row + 2;
        self.rows
            .iter()
            .skip(1)
            .enumerate()
            .map(move |(index, row)| (first + index, row.as_slice()))
    }

    /// All data values of one column; short rows read as empty.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &RawCell> + '_ {
        const EMPTY: &RawCell = &RawCell::Empty;
        self.rows
            .iter()
            .skip(1)
            .map(move |row| row.get(index).unwrap_or(EMPTY))
    }
}

/// All worksheets of one file, in workbook order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
}

/// Opens and fully reads a workbook.
///
/// The format is chosen by file extension; the underlying file is closed before returning.
///
/// # Errors
///
/// Returns an error if the extension is unsupported, the file cannot be parsed, a sheet cannot
/// be read, or the workbook has no sheets.
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, SpreadsheetError> {
    let path = path.as_ref();
    let name = path.to_string_lossy().to_string();
    match path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase).as_deref() {
        Some("xlsx" | "xlsm" | "xlam" | "xlsb" | "xls" | "xla" | "ods") => (),
        _ => return Err(SpreadsheetError::InvalidFileFormat { name }),
    }

    let mut reader = open_workbook_auto(path).map_err(|source| SpreadsheetError::OpenError {
        name: name.to_owned(),
        source,
    })?;
    let mut sheets = Vec::new();
    for sheet in reader.sheet_names() {
        let range = reader
            .worksheet_range(&sheet)
            .map_err(|source| SpreadsheetError::SheetError {
                sheet: sheet.to_owned(),
                source,
            })?;
        sheets.push(Worksheet::from_range(&sheet, &range));
    }

    if sheets.is_empty() {
        Err(SpreadsheetError::NoSheets { name })
    } else {
        Ok(Workbook { sheets })
    }
}
