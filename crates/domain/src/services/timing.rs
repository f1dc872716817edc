//! Pick timing analytics for order log exports.
//!
//! Each log entry is annotated with the whole seconds elapsed since the
//! previous entry. The gaps drive the per-row severity coloring and the run
//! summary written under the table.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::CellValue;

/// Gaps at or above this many seconds are high severity and are left out of
/// the filtered average.
pub const HIGH_GAP_SECONDS: i64 = 10;

/// Gaps at or above this many seconds (and below [`HIGH_GAP_SECONDS`]) are
/// medium severity.
pub const MEDIUM_GAP_SECONDS: i64 = 5;

/// Something with an absolute creation time.
pub trait Timestamped {
    fn created_at(&self) -> NaiveDateTime;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimingError {
    #[error("Negative gap of {seconds}s at row {index}: rows are not ordered by created_at")]
    NegativeGap { index: usize, seconds: i64 },
}

/// A row together with its derived gap.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow<T> {
    pub row: T,
    pub elapsed_seconds: i64,
}

impl<T: Timestamped> Timestamped for TimedRow<T> {
    fn created_at(&self) -> NaiveDateTime {
        self.row.created_at()
    }
}

/// Gaps between consecutive rows, in whole seconds truncated toward zero.
///
/// The first row has no predecessor and gets 0. `rows` must already be in
/// ascending `created_at` order.
pub fn elapsed_seconds<T: Timestamped>(rows: &[T]) -> Result<Vec<i64>, TimingError> {
    let mut gaps = Vec::with_capacity(rows.len());
    let mut previous: Option<NaiveDateTime> = None;

    for (index, row) in rows.iter().enumerate() {
        let current = row.created_at();
        let gap = match previous {
            None => 0,
            Some(prev) => (current - prev).num_seconds(),
        };
        if gap < 0 {
            return Err(TimingError::NegativeGap {
                index,
                seconds: gap,
            });
        }
        gaps.push(gap);
        previous = Some(current);
    }

    Ok(gaps)
}

/// Sort rows by `created_at` (stable, so ties keep query order) and attach
/// their gaps.
pub fn derive_elapsed<T: Timestamped>(mut rows: Vec<T>) -> Result<Vec<TimedRow<T>>, TimingError> {
    rows.sort_by_key(|row| row.created_at());
    let gaps = elapsed_seconds(&rows)?;

    Ok(rows
        .into_iter()
        .zip(gaps)
        .map(|(row, elapsed_seconds)| TimedRow {
            row,
            elapsed_seconds,
        })
        .collect())
}

/// Presentation band of an elapsed gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityBand {
    Low,
    Medium,
    High,
    /// The value could not be read as a number. No fill is applied.
    Unclassified,
}

impl SeverityBand {
    pub fn classify(seconds: i64) -> Self {
        if seconds >= HIGH_GAP_SECONDS {
            SeverityBand::High
        } else if seconds >= MEDIUM_GAP_SECONDS {
            SeverityBand::Medium
        } else {
            SeverityBand::Low
        }
    }

    /// Classify whatever ended up in a spreadsheet cell. Never fails:
    /// anything that is not a number is [`SeverityBand::Unclassified`].
    pub fn classify_cell(cell: &CellValue) -> Self {
        match cell {
            CellValue::Integer(v) => Self::classify(*v),
            CellValue::Number(v) if v.is_finite() => Self::classify(v.trunc() as i64),
            CellValue::Text(text) => Self::classify_text(text),
            _ => SeverityBand::Unclassified,
        }
    }

    pub fn classify_text(text: &str) -> Self {
        let text = text.trim();
        if let Ok(v) = text.parse::<i64>() {
            return Self::classify(v);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::classify(v.trunc() as i64),
            _ => SeverityBand::Unclassified,
        }
    }

    /// Cell background as `0xRRGGBB`.
    pub fn fill_rgb(&self) -> Option<u32> {
        match self {
            SeverityBand::High => Some(0xFFC7CE),
            SeverityBand::Medium => Some(0xFFEB9C),
            SeverityBand::Low => Some(0xC6EFCE),
            SeverityBand::Unclassified => None,
        }
    }

    /// Inverse of [`SeverityBand::fill_rgb`].
    pub fn from_fill_rgb(rgb: Option<u32>) -> Self {
        match rgb {
            Some(0xFFC7CE) => SeverityBand::High,
            Some(0xFFEB9C) => SeverityBand::Medium,
            Some(0xC6EFCE) => SeverityBand::Low,
            _ => SeverityBand::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Low => "low",
            SeverityBand::Medium => "medium",
            SeverityBand::High => "high",
            SeverityBand::Unclassified => "unclassified",
        }
    }
}

/// Whole-run timing statistics of an order log export.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub row_count: usize,
    /// Last `created_at` minus first, whole seconds.
    pub total_duration_seconds: i64,
    /// Mean gap over all rows, including the leading 0.
    pub raw_average_elapsed: f64,
    /// Mean gap over rows below [`HIGH_GAP_SECONDS`]; 0 when there are none.
    pub filtered_average_elapsed: f64,
    /// `filtered_average_elapsed * row_count`, floored to whole seconds.
    pub filtered_projected_seconds: i64,
}

impl RunSummary {
    /// Returns `None` for an empty run.
    pub fn compute<T: Timestamped>(rows: &[TimedRow<T>]) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;
        let row_count = rows.len();

        let total_duration_seconds = (last.created_at() - first.created_at()).num_seconds();

        let total: i64 = rows.iter().map(|r| r.elapsed_seconds).sum();
        let raw_average_elapsed = total as f64 / row_count as f64;

        let normal: Vec<i64> = rows
            .iter()
            .map(|r| r.elapsed_seconds)
            .filter(|gap| *gap < HIGH_GAP_SECONDS)
            .collect();
        let filtered_average_elapsed = if normal.is_empty() {
            0.0
        } else {
            normal.iter().sum::<i64>() as f64 / normal.len() as f64
        };

        let filtered_projected_seconds =
            (filtered_average_elapsed * row_count as f64).floor() as i64;

        Some(Self {
            row_count,
            total_duration_seconds,
            raw_average_elapsed,
            filtered_average_elapsed,
            filtered_projected_seconds,
        })
    }

    pub fn total_duration_text(&self) -> String {
        format_duration(self.total_duration_seconds)
    }

    pub fn filtered_projected_text(&self) -> String {
        format_duration(self.filtered_projected_seconds)
    }
}

/// `"H hours M minutes S seconds"`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{} hours {} minutes {} seconds",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Round to six decimals for the summary cells.
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
