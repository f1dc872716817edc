//! Excel workbook rendering for export artifacts.
//!
//! Workbooks are written to a temporary sibling file and renamed into place,
//! so a reader never sees a half-written artifact under its final name.

use domain::models::{CellValue, SheetRow};
use domain::services::timing::round6;
use domain::services::{RunSummary, SeverityBand, TimedRow, Timestamped};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header of the derived gap column.
pub const ELAPSED_HEADER: &str = "ElapsedSeconds";

/// The gap column is placed right after this column.
pub const CREATED_AT_HEADER: &str = "created_at";

/// Footer label of the observed run duration.
pub const ACTUAL_LABEL: &str = "Actual";

/// Footer label of the projection built from the filtered average.
pub const FILTERED_LABEL: &str = "Filtered average (red values excluded)";

/// Prefix of the temporary file a workbook is saved to before the rename.
pub const TEMP_PREFIX: &str = "incomplete_";

/// Row limit of the xlsx format.
const MAX_SHEET_ROWS: usize = 1_048_576;

/// Workbook rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact path: {0}")]
    InvalidPath(PathBuf),

    #[error("Row has {actual} cells but the sheet has {expected} columns")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("{0} rows do not fit in one worksheet")]
    TooManyRows(usize),
}

/// What ended up in a written workbook.
#[derive(Debug, Clone)]
pub struct RenderedWorkbook {
    pub path: PathBuf,
    pub data_rows: usize,
    /// Band applied to each data row's gap cell, in row order. Empty for
    /// tables without a gap column.
    pub bands: Vec<SeverityBand>,
    pub summary: Option<RunSummary>,
}

/// Write a plain table: one header row, one line per row.
pub fn write_table<T: SheetRow>(path: &Path, rows: &[T]) -> Result<RenderedWorkbook, RenderError> {
    check_row_count(rows.len())?;
    let headers = T::headers();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_header(worksheet, headers)?;

    for (i, row) in rows.iter().enumerate() {
        let cells = row.cells();
        check_width(headers.len(), cells.len())?;
        let excel_row = (i + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            write_cell(worksheet, excel_row, col as u16, cell, None)?;
        }
    }
    worksheet.autofit();

    save_atomically(&mut workbook, path)?;

    Ok(RenderedWorkbook {
        path: path.to_path_buf(),
        data_rows: rows.len(),
        bands: Vec::new(),
        summary: None,
    })
}

/// Write an order log table with its gap column, severity fills, and the
/// run summary footer. An empty run produces a header-only workbook.
pub fn write_order_log<T: SheetRow + Timestamped>(
    path: &Path,
    rows: &[TimedRow<T>],
) -> Result<RenderedWorkbook, RenderError> {
    check_row_count(rows.len())?;

    let base_headers = T::headers();
    let elapsed_col = base_headers
        .iter()
        .position(|h| *h == CREATED_AT_HEADER)
        .map(|i| i + 1)
        .unwrap_or(base_headers.len());
    let mut headers: Vec<&str> = base_headers.to_vec();
    headers.insert(elapsed_col, ELAPSED_HEADER);

    let fills = BandFills::new();
    let mut bands = Vec::with_capacity(rows.len());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_header(worksheet, &headers)?;

    for (i, timed) in rows.iter().enumerate() {
        let mut cells = timed.row.cells();
        check_width(base_headers.len(), cells.len())?;
        cells.insert(elapsed_col, CellValue::Integer(timed.elapsed_seconds));

        let band = SeverityBand::classify_cell(&cells[elapsed_col]);
        let excel_row = (i + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            let format = if col == elapsed_col {
                fills.for_band(band)
            } else {
                None
            };
            write_cell(worksheet, excel_row, col as u16, cell, format)?;
        }
        bands.push(band);
    }

    let summary = RunSummary::compute(rows);
    if let Some(summary) = &summary {
        write_summary(worksheet, footer_row(rows.len()), summary)?;
    }
    worksheet.autofit();

    save_atomically(&mut workbook, path)?;

    Ok(RenderedWorkbook {
        path: path.to_path_buf(),
        data_rows: rows.len(),
        bands,
        summary,
    })
}

/// First footer row (zero based): two rows below the last data row.
pub fn footer_row(data_rows: usize) -> u32 {
    data_rows as u32 + 2
}

/// Background fills of the gap column.
struct BandFills {
    low: Format,
    medium: Format,
    high: Format,
}

impl BandFills {
    fn new() -> Self {
        let fill = |band: SeverityBand| {
            let rgb = band.fill_rgb().unwrap_or(0xFFFFFF);
            Format::new().set_background_color(Color::RGB(rgb))
        };
        Self {
            low: fill(SeverityBand::Low),
            medium: fill(SeverityBand::Medium),
            high: fill(SeverityBand::High),
        }
    }

    fn for_band(&self, band: SeverityBand) -> Option<&Format> {
        match band {
            SeverityBand::Low => Some(&self.low),
            SeverityBand::Medium => Some(&self.medium),
            SeverityBand::High => Some(&self.high),
            SeverityBand::Unclassified => None,
        }
    }
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    Ok(())
}

/// The 2x3 summary block: label, human readable duration, average gap.
fn write_summary(
    worksheet: &mut Worksheet,
    first_row: u32,
    summary: &RunSummary,
) -> Result<(), XlsxError> {
    let boxed = Format::new().set_border(FormatBorder::Thin);

    let lines = [
        (
            ACTUAL_LABEL,
            summary.total_duration_text(),
            summary.raw_average_elapsed,
        ),
        (
            FILTERED_LABEL,
            summary.filtered_projected_text(),
            summary.filtered_average_elapsed,
        ),
    ];

    for (offset, (label, duration, average)) in lines.iter().enumerate() {
        let row = first_row + offset as u32;
        worksheet.write_string_with_format(row, 0, *label, &boxed)?;
        worksheet.write_string_with_format(row, 1, duration.as_str(), &boxed)?;
        worksheet.write_number_with_format(row, 2, round6(*average), &boxed)?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::Empty => {
            if let Some(format) = format {
                worksheet.write_blank(row, col, format)?;
            }
        }
        CellValue::Integer(v) => write_number(worksheet, row, col, *v as f64, format)?,
        CellValue::Number(v) if v.is_finite() => write_number(worksheet, row, col, *v, format)?,
        other => {
            let text = other.display().unwrap_or_default();
            match format {
                Some(format) => {
                    worksheet.write_string_with_format(row, col, text.as_str(), format)?;
                }
                None => {
                    worksheet.write_string(row, col, text.as_str())?;
                }
            }
        }
    }
    Ok(())
}

fn write_number(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: f64,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match format {
        Some(format) => worksheet.write_number_with_format(row, col, value, format)?,
        None => worksheet.write_number(row, col, value)?,
    };
    Ok(())
}

fn check_width(expected: usize, actual: usize) -> Result<(), RenderError> {
    if expected != actual {
        return Err(RenderError::ColumnMismatch { expected, actual });
    }
    Ok(())
}

fn check_row_count(rows: usize) -> Result<(), RenderError> {
    // header, data, blank spacer, two footer rows
    if rows + 4 > MAX_SHEET_ROWS {
        return Err(RenderError::TooManyRows(rows));
    }
    Ok(())
}

/// Temporary sibling of an artifact path.
pub fn temp_path_for(path: &Path) -> Result<PathBuf, RenderError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RenderError::InvalidPath(path.to_path_buf()))?;
    let mut temp_name = std::ffi::OsString::from(TEMP_PREFIX);
    temp_name.push(file_name);
    Ok(path.with_file_name(temp_name))
}

/// Save to the temporary path, then rename over `path`. On any failure the
/// temporary file is removed and `path` is left untouched.
fn save_atomically(workbook: &mut Workbook, path: &Path) -> Result<(), RenderError> {
    let temp_path = temp_path_for(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let result = workbook
        .save(&temp_path)
        .map_err(RenderError::from)
        .and_then(|_| fs::rename(&temp_path, path).map_err(RenderError::from));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
