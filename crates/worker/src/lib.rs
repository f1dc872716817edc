//! Worker that turns pending warehouse export jobs into Excel workbooks.

pub mod config;
pub mod jobs;
pub mod logging;
pub mod services;
pub mod telemetry;
