//! Background job scheduler and job implementations.

mod export_processing;
mod pool_metrics;
mod scheduler;

pub use export_processing::ExportProcessingJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobScheduler};
