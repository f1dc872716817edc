//! Export processing background job.

use std::time::Duration;

use crate::services::ExportService;

use super::scheduler::Job;

/// Background job that claims and processes one pending export per run.
pub struct ExportProcessingJob {
    service: ExportService,
    interval: Duration,
}

impl ExportProcessingJob {
    /// Create a new export processing job.
    ///
    /// # Arguments
    /// * `service` - Export service used to process jobs
    /// * `interval` - Sleep between two polls of the job table
    pub fn new(service: ExportService, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait::async_trait]
impl Job for ExportProcessingJob {
    fn name(&self) -> &'static str {
        "export_processing"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    /// Failures of the export itself are recorded on the job row by the
    /// service; only job table errors surface here.
    async fn execute(&self) -> Result<(), String> {
        self.service
            .process_next_job()
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to process export jobs: {}", e))
    }
}
