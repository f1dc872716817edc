//! Export job repository for database operations.
//!
//! The `export_jobs` table is owned by the web application. This worker only
//! reads pending rows and moves them through `processing` to `done` or
//! `failed`.

use domain::models::{ExportJobStatus, ExportTable};
use sqlx::MySqlPool;
use tracing::warn;

use crate::entities::ExportJobEntity;
use crate::metrics::QueryTimer;

/// Repository for export job database operations.
#[derive(Clone)]
pub struct ExportJobRepository {
    pool: MySqlPool,
}

/// Domain model for an export job row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub id: i64,
    pub table_name: String,
    pub status: ExportJobStatus,
    pub percent: i64,
    pub search_values: Option<String>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}

impl ExportJobRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Oldest pending job for a table this worker handles.
    pub async fn find_next_pending(&self) -> Result<Option<ExportJob>, sqlx::Error> {
        let timer = QueryTimer::new("find_next_pending_export_job");
        let sql = pending_job_query();
        let mut query = sqlx::query_as::<_, ExportJobEntity>(&sql);
        for table in ExportTable::ALL {
            query = query.bind(table.as_str());
        }
        let result = query
            .bind(ExportJobStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        Ok(result?.map(entity_to_domain))
    }

    /// Move a job from `pending` to `processing`.
    ///
    /// Returns `false` when the row is no longer pending, i.e. another worker
    /// claimed it first.
    pub async fn claim(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("claim_export_job");
        let result = sqlx::query(
            r#"
            UPDATE export_jobs
            SET status = ?, percent = 0
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(ExportJobStatus::Processing.as_str())
        .bind(id)
        .bind(ExportJobStatus::Pending.as_str())
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result?.rows_affected() > 0)
    }

    /// Mark a processing job as done with its artifact location.
    pub async fn mark_completed(
        &self,
        id: i64,
        file_name: &str,
        file_path: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("complete_export_job");
        let result = sqlx::query(
            r#"
            UPDATE export_jobs
            SET status = ?, percent = 100, file_name = ?, file_path = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(ExportJobStatus::Done.as_str())
        .bind(file_name)
        .bind(file_path)
        .bind(id)
        .bind(ExportJobStatus::Processing.as_str())
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result?.rows_affected() > 0)
    }

    /// Mark a job that has not finished as failed.
    pub async fn mark_failed(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("fail_export_job");
        let result = sqlx::query(
            r#"
            UPDATE export_jobs
            SET status = ?, percent = 0
            WHERE id = ? AND status IN (?, ?)
            "#,
        )
        .bind(ExportJobStatus::Failed.as_str())
        .bind(id)
        .bind(ExportJobStatus::Pending.as_str())
        .bind(ExportJobStatus::Processing.as_str())
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result?.rows_affected() > 0)
    }

    /// Fetch a job by id regardless of status.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ExportJob>, sqlx::Error> {
        let timer = QueryTimer::new("find_export_job_by_id");
        let result = sqlx::query_as::<_, ExportJobEntity>(
            r#"
            SELECT CAST(id AS SIGNED) AS id,
                   CAST(table_name AS CHAR) AS table_name,
                   CAST(status AS CHAR) AS status,
                   CAST(percent AS SIGNED) AS percent,
                   CAST(search_values AS CHAR) AS search_values,
                   file_name,
                   file_path
            FROM export_jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result?.map(entity_to_domain))
    }
}

/// Oldest-first pending job query with one placeholder per exportable table.
fn pending_job_query() -> String {
    let placeholders = vec!["?"; ExportTable::ALL.len()].join(", ");
    format!(
        r#"
        SELECT CAST(id AS SIGNED) AS id,
               CAST(table_name AS CHAR) AS table_name,
               CAST(status AS CHAR) AS status,
               CAST(percent AS SIGNED) AS percent,
               CAST(search_values AS CHAR) AS search_values,
               file_name,
               file_path
        FROM export_jobs
        WHERE table_name IN ({}) AND status = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
        placeholders
    )
}

fn entity_to_domain(entity: ExportJobEntity) -> ExportJob {
    let status = entity.status.parse::<ExportJobStatus>().unwrap_or_else(|e| {
        warn!(job_id = entity.id, error = %e, "Unknown export job status");
        ExportJobStatus::Pending
    });

    ExportJob {
        id: entity.id,
        table_name: entity.table_name,
        status,
        percent: entity.percent.unwrap_or(0),
        search_values: entity.search_values,
        file_name: entity.file_name,
        file_path: entity.file_path,
    }
}
