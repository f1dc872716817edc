//! Export job models.
//!
//! An export job is a row in the `export_jobs` table written by the web
//! application. Its `search_values` column is parsed once, at claim time, into
//! a typed [`ExportRequest`].

use chrono::{Duration, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use super::search_values::{decode_search_values, flag_value, text_value};

/// Format of the `min`/`max` bounds of an order log export.
pub const SEARCH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Timestamp suffix used in generated file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

lazy_static! {
    static ref FILE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._ -]{0,200}$").unwrap();
}

/// Errors raised while turning `search_values` into an [`ExportRequest`].
#[derive(Debug, Error)]
pub enum ExportParamsError {
    #[error("Invalid search parameters: {0}")]
    Parameter(String),

    #[error("Invalid timestamp for '{key}': '{value}' (expected YYYY-MM-DDTHH:MM)")]
    TimeParse {
        key: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<validator::ValidationErrors> for ExportParamsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();

        ExportParamsError::Parameter(messages.join("; "))
    }
}

/// Lifecycle state of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportJobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ExportJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportJobStatus::Pending => "pending",
            ExportJobStatus::Processing => "processing",
            ExportJobStatus::Done => "done",
            ExportJobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExportJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportJobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ExportJobStatus::Pending),
            "processing" => Ok(ExportJobStatus::Processing),
            "done" => Ok(ExportJobStatus::Done),
            "failed" => Ok(ExportJobStatus::Failed),
            _ => Err(format!("Unknown export job status: {}", s)),
        }
    }
}

/// Source table an export job reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTable {
    Orders,
    OrdersLogs,
}

impl ExportTable {
    /// Every table this worker knows how to export.
    pub const ALL: [ExportTable; 2] = [ExportTable::Orders, ExportTable::OrdersLogs];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportTable::Orders => "orders",
            ExportTable::OrdersLogs => "orders_logs",
        }
    }

    /// Sub-directory of the export root the artifact is written to.
    pub fn category(&self) -> &'static str {
        match self {
            ExportTable::Orders => "orderList",
            ExportTable::OrdersLogs => "orderLog",
        }
    }
}

impl fmt::Display for ExportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orders" => Ok(ExportTable::Orders),
            "orders_logs" => Ok(ExportTable::OrdersLogs),
            _ => Err(format!("Unsupported export table: {}", s)),
        }
    }
}

/// Parameters of an order items export.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct OrderExportParams {
    #[validate(range(min = 1, message = "order_id must be a positive integer"))]
    pub order_id: i64,

    /// Write into the local deployment's export tree.
    pub local: bool,
}

/// Parameters of an order log export.
///
/// `min` and `max` are wall-clock times as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct LogExportParams {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,

    #[validate(length(max = 64, message = "action must be at most 64 characters"))]
    pub action: Option<String>,

    /// Write into the local deployment's export tree.
    pub local: bool,
}

impl LogExportParams {
    /// Query bounds in store time: the user's wall-clock bounds shifted back
    /// by `offset_hours`.
    pub fn store_window(&self, offset_hours: i64) -> (NaiveDateTime, NaiveDateTime) {
        let offset = Duration::hours(offset_hours);
        (self.min - offset, self.max - offset)
    }
}

/// A validated export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    Orders(OrderExportParams),
    OrdersLogs(LogExportParams),
}

impl ExportRequest {
    /// Parse and validate the raw `search_values` of a job for `table`.
    pub fn parse(table: ExportTable, raw: &str) -> Result<Self, ExportParamsError> {
        let map = decode_search_values(raw).map_err(ExportParamsError::Parameter)?;
        let local = flag_value(&map, "local_host");

        let request = match table {
            ExportTable::Orders => {
                let raw_id = text_value(&map, "order_id").ok_or_else(|| {
                    ExportParamsError::Parameter("Missing 'order_id' parameter".to_string())
                })?;
                let order_id = parse_whole_number(&raw_id).ok_or_else(|| {
                    ExportParamsError::Parameter(format!(
                        "order_id must be an integer, got '{}'",
                        raw_id
                    ))
                })?;

                let params = OrderExportParams { order_id, local };
                params.validate()?;
                ExportRequest::Orders(params)
            }
            ExportTable::OrdersLogs => {
                let min = parse_bound(&map, "min")?;
                let max = parse_bound(&map, "max")?;
                if min > max {
                    return Err(ExportParamsError::Parameter(format!(
                        "min ({}) is after max ({})",
                        min.format(SEARCH_TIME_FORMAT),
                        max.format(SEARCH_TIME_FORMAT)
                    )));
                }

                let params = LogExportParams {
                    min,
                    max,
                    action: text_value(&map, "action"),
                    local,
                };
                params.validate()?;
                ExportRequest::OrdersLogs(params)
            }
        };

        Ok(request)
    }

    pub fn table(&self) -> ExportTable {
        match self {
            ExportRequest::Orders(_) => ExportTable::Orders,
            ExportRequest::OrdersLogs(_) => ExportTable::OrdersLogs,
        }
    }

    pub fn is_local(&self) -> bool {
        match self {
            ExportRequest::Orders(params) => params.local,
            ExportRequest::OrdersLogs(params) => params.local,
        }
    }

    /// File name used when the job does not carry one.
    pub fn default_file_name(&self, now: NaiveDateTime) -> String {
        let stamp = now.format(FILE_TIMESTAMP_FORMAT);
        match self {
            ExportRequest::Orders(params) => format!("orders_{}_{}.xlsx", params.order_id, stamp),
            ExportRequest::OrdersLogs(_) => format!("orders_logs_{}.xlsx", stamp),
        }
    }
}

/// Pick the artifact name: the job's own `file_name` when set, otherwise a
/// generated one. A supplied name must be a plain file name.
pub fn resolve_file_name(
    requested: Option<&str>,
    request: &ExportRequest,
    now: NaiveDateTime,
) -> Result<String, ExportParamsError> {
    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) if FILE_NAME_REGEX.is_match(name) && !name.contains("..") => {
            Ok(name.to_string())
        }
        Some(name) => Err(ExportParamsError::Parameter(format!(
            "file_name '{}' is not a plain file name",
            name
        ))),
        None => Ok(request.default_file_name(now)),
    }
}

/// Integer value of `raw`. Whole floats such as `5.0` are accepted, since
/// the producer may serialize ids as floats.
fn parse_whole_number(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn parse_bound(
    map: &serde_json::Map<String, serde_json::Value>,
    key: &'static str,
) -> Result<NaiveDateTime, ExportParamsError> {
    let value = text_value(map, key).ok_or_else(|| {
        ExportParamsError::Parameter(format!("Missing '{}' parameter", key))
    })?;

    NaiveDateTime::parse_from_str(&value, SEARCH_TIME_FORMAT).map_err(|source| {
        ExportParamsError::TimeParse { key, value, source }
    })
}
