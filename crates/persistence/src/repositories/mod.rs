//! Repository implementations for database operations.

pub mod export_job;
pub mod order_item;
pub mod order_log;

pub use export_job::{ExportJob, ExportJobRepository};
pub use order_item::OrderItemRepository;
pub use order_log::OrderLogRepository;
