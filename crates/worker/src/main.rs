use anyhow::Result;
use tracing::info;

use order_export_worker::config::Config;
use order_export_worker::jobs::{ExportProcessingJob, JobScheduler, PoolMetricsJob};
use order_export_worker::logging::init_logging;
use order_export_worker::services::ExportService;
use order_export_worker::telemetry::init_metrics;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting order export worker v{}", env!("CARGO_PKG_VERSION"));

    init_metrics(&config.metrics)?;

    // Create database pool
    let db_config: persistence::db::DatabaseConfig = config.database.clone().into();
    let pool = persistence::db::create_pool(&db_config).await?;
    info!(
        export_root = %config.export.root.display(),
        poll_interval_secs = config.worker.poll_interval_secs,
        "Database pool ready"
    );

    let mut scheduler = JobScheduler::new();
    scheduler.register(ExportProcessingJob::new(
        ExportService::new(pool.clone(), config.export.clone()),
        config.worker.poll_interval(),
    ));
    scheduler.register(PoolMetricsJob::new(
        pool.clone(),
        config.worker.pool_metrics_interval(),
    ));
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler.shutdown();
    scheduler
        .wait_for_shutdown(config.worker.shutdown_timeout())
        .await;

    pool.close().await;
    info!("Worker stopped");

    Ok(())
}
