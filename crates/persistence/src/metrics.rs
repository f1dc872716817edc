//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::MySqlPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record connection pool gauges. Called periodically by the worker.
pub fn record_pool_metrics(pool: &MySqlPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a query and records it under `database_query_duration_seconds`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_next_pending_export_job");
/// let result = sqlx::query_as::<_, ExportJobEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(self.query_name, duration);
    }
}
