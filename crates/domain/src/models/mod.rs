//! Domain models for export jobs.

pub mod export_job;
pub mod search_values;
pub mod sheet;

pub use export_job::{
    resolve_file_name, ExportJobStatus, ExportParamsError, ExportRequest, ExportTable,
    LogExportParams, OrderExportParams,
};
pub use sheet::{CellValue, SheetRow};
