//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod export_job;
pub mod order_item;
pub mod order_log;

pub use export_job::ExportJobEntity;
pub use order_item::{OrderItemEntity, ORDER_ITEM_HEADERS};
pub use order_log::{OrderLogEntity, ORDER_LOG_HEADERS};
