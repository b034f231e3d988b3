use calamine::Data;
use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Literal value of one spreadsheet cell, as read from the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawCell {
    #[default]
    Empty,
    /// String values, including error literals such as `#DIV/0!`
    Text(String),
    /// Integers stored as such by the source (ODS, XLSB)
    Integer(i64),
    /// Numeric values; XLSX stores whole numbers this way too
    Number(f64),
    /// Native boolean values
    Boolean(bool),
    /// Date/time values
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Returns true if the cell holds no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// Text rendering used for headers and TEXT columns.
    /// Integral numbers print without a fraction; empty cells print as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(value) => value.to_owned(),
            RawCell::Integer(value) => value.to_string(),
            RawCell::Number(value) if is_integral(*value) => format!("{}", *value as i64),
            RawCell::Number(value) => value.to_string(),
            RawCell::Boolean(value) => value.to_string(),
            RawCell::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => RawCell::Empty,
            Data::String(value) if value.is_empty() => RawCell::Empty,
            Data::String(value) => RawCell::Text(value.to_owned()),
            Data::Int(value) => RawCell::Integer(*value),
            Data::Float(value) => RawCell::Number(*value),
            Data::Bool(value) => RawCell::Boolean(*value),
            Data::DateTime(value) if value.is_duration() => RawCell::Text(duration_text(value.as_f64())),
            Data::DateTime(value) => excel_serial_to_datetime(value.as_f64())
                .map(RawCell::DateTime)
                .unwrap_or_else(|| RawCell::Number(value.as_f64())),
            Data::DateTimeIso(value) => parse_datetime(value)
                .map(RawCell::DateTime)
                .unwrap_or_else(|| RawCell::Text(value.to_owned())),
            Data::DurationIso(value) => RawCell::Text(value.to_owned()),
            Data::Error(error) => RawCell::Text(error.to_string()),
        }
    }
}

impl Display for RawCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Returns true for finite whole numbers that fit in an `i64`.
pub(crate) fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 9.2e18
}

/// Converts an Excel serial number (1900 epoch) to a date-time.
/// Serials below 60 are shifted by one day to undo the Lotus 1-2-3 leap year bug.
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let days = if days < 60 { days + 1 } else { days };
    let micros = (serial.fract() * 86_400_000_000f64).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(Duration::microseconds(micros))
}

/// Renders an Excel duration (fraction of days) as `[h]:mm:ss`, e.g. `36:30:00`.
pub(crate) fn duration_text(days: f64) -> String {
    let seconds = (days * 86_400f64).round() as i64;
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!("{sign}{}:{:02}:{:02}", seconds / 3600, seconds % 3600 / 60, seconds % 60)
}

/// Parses the ISO-like date and date-time renderings found in spreadsheets.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Spreadsheet column code for a 0-based index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letters(index: usize) -> String {
    let mut column = index + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    letters
}
