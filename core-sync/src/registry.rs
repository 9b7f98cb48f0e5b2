//! # Job Registry
//!
//! Owns every asynchronous sync job for the lifetime of the process.
//!
//! `start` records a running job, spawns the reconciliation and returns the
//! job ID at once. The spawned run writes progress snapshots into the job and,
//! on completion, replaces its fields with the terminal result under the
//! write lock so pollers never observe a half-updated job.

use crate::{
    engine::ReconciliationEngine,
    job::{Job, JobId},
    progress::{ProgressSink, ProgressUpdate},
    result::SyncResult,
    Result, SyncError,
};
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinError;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
    clock: Arc<dyn Clock>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Registry stamping jobs with the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Schedule a reconciliation run and return its job ID immediately
    #[instrument(skip(self, engine))]
    pub async fn start(
        &self,
        engine: Arc<ReconciliationEngine>,
        source: &str,
        output: &str,
    ) -> JobId {
        let job = Job::new(source, output, self.clock.now());
        let job_id = job.job_id;

        self.jobs.write().await.insert(job_id, job);

        let sink: Arc<dyn ProgressSink> = Arc::new(JobProgressSink {
            registry: self.clone(),
            job_id,
        });
        let source = source.to_string();
        let output = output.to_string();

        // The run gets its own task so a panic surfaces as a JoinError here
        let run = tokio::spawn(async move {
            engine.process_sync(&source, &output, Some(sink)).await
        });

        let registry = self.clone();
        tokio::spawn(async move {
            registry.finish(job_id, run.await).await;
        });

        info!(job_id = %job_id, "Started async sync job");
        job_id
    }

    /// Current snapshot of a job
    ///
    /// # Errors
    ///
    /// Returns `SyncError::JobNotFound` for unknown IDs
    pub async fn get_status(&self, job_id: JobId) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or_else(|| SyncError::JobNotFound {
                job_id: job_id.to_string(),
            })
    }

    /// Number of jobs recorded since startup
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Apply the outcome of a finished run
    async fn finish(&self, job_id: JobId, outcome: std::result::Result<SyncResult, JoinError>) {
        let now = self.clock.now();
        let mut jobs = self.jobs.write().await;

        let Some(job) = jobs.remove(&job_id) else {
            warn!(job_id = %job_id, "Finished job missing from registry");
            return;
        };

        let transitioned = match outcome {
            Ok(result) => job.clone().finish(result, now),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Sync job aborted");
                job.clone().fail(format!("Sync task aborted: {}", e), now)
            }
        };

        match transitioned {
            Ok(updated) => {
                info!(job_id = %job_id, status = %updated.status, "Sync job finished");
                jobs.insert(job_id, updated);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Rejected job transition");
                jobs.insert(job_id, job);
            }
        }
    }

    async fn record_progress(&self, job_id: JobId, update: ProgressUpdate) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            if let Err(e) = job.update_progress(update) {
                debug!(job_id = %job_id, error = %e, "Dropped progress update");
            }
        }
    }
}

/// Writes engine progress into one job record
struct JobProgressSink {
    registry: JobRegistry,
    job_id: JobId,
}

#[async_trait]
impl ProgressSink for JobProgressSink {
    async fn report(&self, update: ProgressUpdate) {
        self.registry.record_progress(self.job_id, update).await;
    }
}
