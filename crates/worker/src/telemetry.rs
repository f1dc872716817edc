//! Prometheus exporter for the worker's metrics.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

use crate::config::MetricsConfig;

/// Histogram buckets (seconds) for export and query durations.
const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0];

/// Install the global recorder and its HTTP scrape endpoint.
///
/// Does nothing when no listen address is configured; metric macros are then
/// no-ops. Must be called from within the Tokio runtime.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), BuildError> {
    let Some(addr) = config.listen_addr else {
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(DURATION_BUCKETS)?
        .install()?;

    info!(addr = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}
