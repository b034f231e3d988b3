//! Column type inference.
use crate::database::column::ColumnType;
use crate::spreadsheet::RawCell;

/// Infers one type for a whole column.
///
/// Every non-empty cell is classified and folded into the most specific type compatible with all
/// of them, so the result does not depend on row order. Columns without any value are `Text`.
pub fn infer<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a RawCell>,
{
    let mut detected: Option<ColumnType> = None;
    for kind in values.into_iter().filter_map(ColumnType::of) {
        let widened = detected.map_or(kind, |current| current.widen(kind));
        if widened == ColumnType::Text {
            return ColumnType::Text;
        }
        detected = Some(widened);
    }
    detected.unwrap_or(ColumnType::Text)
}
