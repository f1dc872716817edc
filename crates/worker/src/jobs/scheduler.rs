//! Job scheduler infrastructure for background tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging).
    fn name(&self) -> &'static str;

    /// Pause between the end of one execution and the start of the next.
    fn interval(&self) -> Duration;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Background job scheduler.
///
/// Each job runs in its own task: once right away, then again after every
/// `interval`. Shutdown is observed between executions only; an execution in
/// progress always runs to completion.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Create a new job scheduler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Start all registered jobs.
    pub fn start(&mut self) {
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let interval = job.interval();

                info!(job = name, interval_secs = interval.as_secs(), "Job scheduled");

                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }

                    let start = std::time::Instant::now();
                    debug!(job = name, "Job starting");

                    match job.execute().await {
                        Ok(()) => {
                            debug!(
                                job = name,
                                elapsed_ms = start.elapsed().as_millis(),
                                "Job completed successfully"
                            );
                        }
                        Err(e) => {
                            error!(
                                job = name,
                                elapsed_ms = start.elapsed().as_millis(),
                                error = %e,
                                "Job failed"
                            );
                        }
                    }

                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {}
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }

                info!(job = name, "Job shutting down");
            });

            self.handles.push(handle);
        }
    }

    /// Initiate graceful shutdown of all jobs.
    /// Returns immediately after signaling shutdown.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all jobs to complete with timeout. Returns false when the
    /// timeout elapsed first.
    pub async fn wait_for_shutdown(self, timeout: Duration) -> bool {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => {
                info!("All jobs completed gracefully");
                true
            }
            Err(_) => {
                warn!("Job shutdown timed out after {:?}", timeout);
                false
            }
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
