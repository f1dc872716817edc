//! Export services.

pub mod export;
pub mod workbook;

pub use export::{prepare_export, ExportError, ExportService, JobOutcome, PreparedExport};
pub use workbook::{write_order_log, write_table, RenderError, RenderedWorkbook};
