//! Background job to record connection pool metrics.

use sqlx::MySqlPool;
use std::time::Duration;

use super::scheduler::Job;

/// Job that periodically records database connection pool metrics.
pub struct PoolMetricsJob {
    pool: MySqlPool,
    interval: Duration,
}

impl PoolMetricsJob {
    /// Create a new pool metrics job.
    pub fn new(pool: MySqlPool, interval: Duration) -> Self {
        Self { pool, interval }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
