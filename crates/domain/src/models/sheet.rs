//! Tabular row abstraction shared by the query layer and the workbook writer.

use chrono::NaiveDateTime;

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Rendering used for text-only sinks and for date columns.
    pub fn display(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Integer(v) => Some(v.to_string()),
            CellValue::Number(v) => Some(v.to_string()),
            CellValue::Text(v) => Some(v.clone()),
            CellValue::DateTime(v) => Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl CellValue {
    /// Columns the query casts to text because their SQL type varies
    /// (DECIMAL weights, numeric-looking codes). Values that parse as a
    /// number are written as numbers.
    pub fn numeric_text(value: &Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => CellValue::Empty,
            Some(text) => match text.parse::<f64>() {
                Ok(number) if number.is_finite() => CellValue::Number(number),
                _ => CellValue::Text(text.to_string()),
            },
        }
    }
}

impl From<Option<i64>> for CellValue {
    fn from(value: Option<i64>) -> Self {
        value.map(CellValue::Integer).unwrap_or(CellValue::Empty)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Number).unwrap_or(CellValue::Empty)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Empty)
    }
}

impl From<&Option<String>> for CellValue {
    fn from(value: &Option<String>) -> Self {
        value.clone().into()
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// A query result row that can be written as one spreadsheet line.
///
/// `cells` must return exactly one value per entry of `headers`, in order.
pub trait SheetRow {
    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<CellValue>;
}
