//! Export job processing.
//!
//! Claims one pending export job, runs the query behind it, renders the
//! workbook and records the terminal status. Every failure is contained
//! here: the job is marked `failed` and no artifact is left behind.

use chrono::NaiveDateTime;
use domain::models::{resolve_file_name, ExportParamsError, ExportRequest, ExportTable};
use domain::services::{derive_elapsed, TimingError};
use persistence::repositories::{
    ExportJob, ExportJobRepository, OrderItemRepository, OrderLogRepository,
};
use sqlx::MySqlPool;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ExportConfig;
use crate::services::workbook::{self, RenderError, RenderedWorkbook};

/// Export processing errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Params(#[from] ExportParamsError),

    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("Export table not supported: {0}")]
    UnsupportedTable(String),
}

impl ExportError {
    /// Stable short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::Params(ExportParamsError::TimeParse { .. }) => "time_parse",
            ExportError::Params(_) => "parameter",
            ExportError::Query(_) => "query",
            ExportError::Render(_) => "render",
            ExportError::Timing(_) => "timing",
            ExportError::UnsupportedTable(_) => "unsupported_table",
        }
    }
}

/// Result of one processing cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// No pending job.
    Idle,
    /// Another worker claimed the job first.
    Skipped { job_id: i64 },
    Done {
        job_id: i64,
        rows: usize,
        path: PathBuf,
    },
    Failed { job_id: i64, kind: &'static str },
    /// The workbook was written but the row left `processing` before it
    /// could be completed. The artifact is removed.
    Lost { job_id: i64 },
}

impl JobOutcome {
    /// `outcome` label of `export_jobs_total`.
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Idle => "idle",
            JobOutcome::Skipped { .. } => "skipped",
            JobOutcome::Done { .. } => "done",
            JobOutcome::Failed { .. } => "failed",
            JobOutcome::Lost { .. } => "lost",
        }
    }
}

/// Everything decided about a job before touching the data tables.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedExport {
    pub request: ExportRequest,
    pub file_name: String,
    pub path: PathBuf,
}

/// Validate a claimed job and work out where its artifact goes.
pub fn prepare_export(
    job: &ExportJob,
    config: &ExportConfig,
    now: NaiveDateTime,
) -> Result<PreparedExport, ExportError> {
    let table = job
        .table_name
        .parse::<ExportTable>()
        .map_err(|_| ExportError::UnsupportedTable(job.table_name.clone()))?;

    let request = ExportRequest::parse(table, job.search_values.as_deref().unwrap_or(""))?;
    let file_name = resolve_file_name(job.file_name.as_deref(), &request, now)?;
    let path = config
        .root_for(request.is_local())
        .join(table.category())
        .join(&file_name);

    Ok(PreparedExport {
        request,
        file_name,
        path,
    })
}

/// Service that turns pending export jobs into workbooks.
pub struct ExportService {
    jobs: ExportJobRepository,
    logs: OrderLogRepository,
    items: OrderItemRepository,
    config: ExportConfig,
}

impl ExportService {
    pub fn new(pool: MySqlPool, config: ExportConfig) -> Self {
        Self {
            jobs: ExportJobRepository::new(pool.clone()),
            logs: OrderLogRepository::new(pool.clone()),
            items: OrderItemRepository::new(pool),
            config,
        }
    }

    /// Claim and process at most one pending job.
    ///
    /// Errors of the job itself are recorded on the job row; only failures to
    /// read or update the job table are returned.
    pub async fn process_next_job(&self) -> Result<JobOutcome, sqlx::Error> {
        let Some(job) = self.jobs.find_next_pending().await? else {
            debug!("No pending export jobs");
            return Ok(JobOutcome::Idle);
        };

        if !self.jobs.claim(job.id).await? {
            info!(job_id = job.id, table_name = %job.table_name, "Export job already claimed");
            return Ok(JobOutcome::Skipped { job_id: job.id });
        }

        let start = Instant::now();
        let table = job.table_name.clone();
        info!(job_id = job.id, table_name = %table, "Export job started");

        let outcome = match self.run(&job).await {
            Ok((prepared, rendered)) => self.complete(&job, &prepared, rendered).await?,
            Err(e) => self.fail(&job, &e, None).await?,
        };

        metrics::counter!(
            "export_jobs_total",
            "table" => table.clone(),
            "outcome" => outcome.label()
        )
        .increment(1);
        metrics::histogram!("export_job_duration_seconds", "table" => table)
            .record(start.elapsed().as_secs_f64());

        Ok(outcome)
    }

    async fn run(&self, job: &ExportJob) -> Result<(PreparedExport, RenderedWorkbook), ExportError> {
        let now = chrono::Local::now().naive_local();
        let prepared = prepare_export(job, &self.config, now)?;
        let rendered = self.render(&prepared).await?;
        Ok((prepared, rendered))
    }

    async fn render(&self, prepared: &PreparedExport) -> Result<RenderedWorkbook, ExportError> {
        let rendered = match &prepared.request {
            ExportRequest::Orders(params) => {
                let rows = self.items.find_by_order(params.order_id).await?;
                workbook::write_table(&prepared.path, &rows)?
            }
            ExportRequest::OrdersLogs(params) => {
                let (min, max) = params.store_window(self.config.store_offset_hours);
                let rows = self
                    .logs
                    .find_between(min, max, params.action.as_deref())
                    .await?;
                let timed = derive_elapsed(rows)?;
                workbook::write_order_log(&prepared.path, &timed)?
            }
        };
        Ok(rendered)
    }

    async fn complete(
        &self,
        job: &ExportJob,
        prepared: &PreparedExport,
        rendered: RenderedWorkbook,
    ) -> Result<JobOutcome, sqlx::Error> {
        let file_path = rendered.path.to_string_lossy();

        match self
            .jobs
            .mark_completed(job.id, &prepared.file_name, &file_path)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    job_id = job.id,
                    table_name = %job.table_name,
                    "Export job left processing state before completion"
                );
                remove_artifact(job.id, &rendered.path);
                return Ok(JobOutcome::Lost { job_id: job.id });
            }
            Err(e) => {
                let e = ExportError::Query(e);
                return self.fail(job, &e, Some(&rendered.path)).await;
            }
        }

        metrics::counter!("export_rows_total", "table" => job.table_name.clone())
            .increment(rendered.data_rows as u64);

        info!(
            job_id = job.id,
            table_name = %job.table_name,
            rows = rendered.data_rows,
            file_path = %file_path,
            "Export job completed"
        );

        Ok(JobOutcome::Done {
            job_id: job.id,
            rows: rendered.data_rows,
            path: rendered.path,
        })
    }

    async fn fail(
        &self,
        job: &ExportJob,
        e: &ExportError,
        artifact: Option<&Path>,
    ) -> Result<JobOutcome, sqlx::Error> {
        error!(
            job_id = job.id,
            table_name = %job.table_name,
            error = %e,
            error_kind = e.kind(),
            "Export job failed"
        );

        if let Some(path) = artifact {
            remove_artifact(job.id, path);
        }

        self.jobs.mark_failed(job.id).await?;

        Ok(JobOutcome::Failed {
            job_id: job.id,
            kind: e.kind(),
        })
    }
}

fn remove_artifact(job_id: i64, path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(
            job_id = job_id,
            path = %path.display(),
            error = %e,
            "Failed to remove export artifact"
        );
    }
}
