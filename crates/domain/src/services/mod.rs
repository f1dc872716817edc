//! Domain services.

pub mod timing;

pub use timing::{
    derive_elapsed, elapsed_seconds, RunSummary, SeverityBand, TimedRow, Timestamped,
    TimingError, HIGH_GAP_SECONDS, MEDIUM_GAP_SECONDS,
};
