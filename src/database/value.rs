//! Cell to SQL value conversion.
use crate::database::column::ColumnType;
use crate::spreadsheet::cell::{excel_serial_to_datetime, is_integral, parse_datetime};
use crate::spreadsheet::RawCell;
use chrono::NaiveDateTime;

/// A value ready to be bound to an insert statement.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

/// Converts a cell to the column's type.
///
/// Empty cells become `Null`. A cell that cannot be represented in the column type yields an
/// error message; callers substitute `Null` and keep going.
pub fn convert(cell: &RawCell, kind: ColumnType) -> Result<SqlValue, String> {
    if cell.is_empty() {
        return Ok(SqlValue::Null);
    }
    match kind {
        ColumnType::Text => Ok(SqlValue::Text(cell.to_text())),
        ColumnType::Boolean => to_boolean(cell).map(SqlValue::Boolean),
        ColumnType::Integer => to_integer(cell).map(SqlValue::Integer),
        ColumnType::Float => to_float(cell).map(SqlValue::Float),
        ColumnType::DateTime => to_datetime(cell).map(SqlValue::DateTime),
    }
}

fn to_boolean(cell: &RawCell) -> Result<bool, String> {
    match cell {
        RawCell::Boolean(value) => Ok(*value),
        RawCell::Integer(0) => Ok(false),
        RawCell::Integer(1) => Ok(true),
        RawCell::Number(value) if *value == 0.0 => Ok(false),
        RawCell::Number(value) if *value == 1.0 => Ok(true),
        RawCell::Text(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "0" => Ok(false),
            _ => Err(format!("parse '{value}' to boolean failed")),
        },
        _ => Err(format!("cast '{cell}' to boolean failed")),
    }
}

fn to_integer(cell: &RawCell) -> Result<i64, String> {
    match cell {
        RawCell::Integer(value) => Ok(*value),
        RawCell::Number(value) if is_integral(*value) => Ok(*value as i64),
        RawCell::Boolean(value) => Ok(i64::from(*value)),
        RawCell::Text(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("parse '{value}' to integer failed")),
        _ => Err(format!("cast '{cell}' to integer failed")),
    }
}

fn to_float(cell: &RawCell) -> Result<f64, String> {
    match cell {
        RawCell::Number(value) => Ok(*value),
        RawCell::Integer(value) => Ok(*value as f64),
        RawCell::Boolean(value) => Ok(if *value { 1.0 } else { 0.0 }),
        RawCell::Text(value) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("parse '{value}' to float failed")),
        _ => Err(format!("cast '{cell}' to float failed")),
    }
}

fn to_datetime(cell: &RawCell) -> Result<NaiveDateTime, String> {
    match cell {
        RawCell::DateTime(value) => Ok(*value),
        RawCell::Number(value) => excel_serial_to_datetime(*value)
            .ok_or_else(|| format!("serial '{value}' is not a valid date")),
        RawCell::Integer(value) => excel_serial_to_datetime(*value as f64)
            .ok_or_else(|| format!("serial '{value}' is not a valid date")),
        RawCell::Text(value) => {
            parse_datetime(value).ok_or_else(|| format!("parse '{value}' to datetime failed"))
        }
        _ => Err(format!("cast '{cell}' to datetime failed")),
    }
}
