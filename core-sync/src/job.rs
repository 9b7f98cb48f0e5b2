//! # Sync Job State Machine
//!
//! Lifecycle of an asynchronous sync run with validated state transitions.
//!
//! ## State Machine
//!
//! ```text
//! Running → Completed
//!    ↓
//!  Failed
//! ```
//!
//! Jobs are created already running. Terminal states are final: any further
//! transition is rejected with `SyncError::InvalidStateTransition`.

use crate::{
    progress::{ProgressUpdate, SyncPhase},
    result::{FailedItem, SyncResult, SyncStatus},
    Result, SyncError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new random job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a job ID from a string
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidJobId` if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s.trim()).map_err(|e| SyncError::InvalidJobId(e.to_string()))?,
        ))
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for JobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for JobId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

// ============================================================================
// Status Types
// ============================================================================

/// The current status of a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Reconciliation is executing
    Running,
    /// The run finished (items may still have failed)
    Completed,
    /// The run aborted
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl From<SyncStatus> for JobStatus {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Completed => JobStatus::Completed,
            SyncStatus::Failed => JobStatus::Failed,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Progress Types
// ============================================================================

/// Live progress of a running job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub phase: SyncPhase,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            phase: SyncPhase::Listing,
        }
    }
}

impl From<ProgressUpdate> for JobProgress {
    fn from(update: ProgressUpdate) -> Self {
        Self {
            total: update.total,
            completed: update.completed,
            failed: update.failed,
            phase: update.phase,
        }
    }
}

// ============================================================================
// Job Entity
// ============================================================================

/// A background sync run and its latest known result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub source: String,
    pub output: String,
    pub processed: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub skipped: Vec<String>,
    pub deleted: Vec<String>,
    pub error: Option<String>,
    pub progress: JobProgress,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a job in the running state
    pub fn new(source: impl Into<String>, output: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            job_id: JobId::new(),
            status: JobStatus::Running,
            source: source.into(),
            output: output.into(),
            processed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            deleted: Vec::new(),
            error: None,
            progress: JobProgress::default(),
            created_at: now,
            completed_at: None,
        }
    }

    /// Record a progress snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not running
    pub fn update_progress(&mut self, update: ProgressUpdate) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(SyncError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: "update_progress".to_string(),
                reason: "Job must be running to update progress".to_string(),
            });
        }

        self.progress = update.into();
        Ok(())
    }

    /// Move to the terminal state a finished run implies
    ///
    /// A result with `status = failed` fails the job; otherwise it completes.
    pub fn finish(mut self, result: SyncResult, now: DateTime<Utc>) -> Result<Self> {
        let to = JobStatus::from(result.status);
        self.validate_transition(to)?;

        self.status = to;
        self.source = result.source;
        self.output = result.output;
        self.progress.completed = result.processed.len();
        self.progress.failed = result.failed.len();
        self.progress.phase = SyncPhase::Finished;
        self.processed = result.processed;
        self.failed = result.failed;
        self.skipped = result.skipped;
        self.deleted = result.deleted;
        self.error = result.error;
        self.completed_at = Some(now);
        Ok(self)
    }

    /// Mark the job as failed with an error message
    ///
    /// # Errors
    ///
    /// Returns an error if the job is already terminal
    pub fn fail(mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<Self> {
        self.validate_transition(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.progress.phase = SyncPhase::Finished;
        self.completed_at = Some(now);
        Ok(self)
    }

    /// Validate a state transition
    fn validate_transition(&self, to: JobStatus) -> Result<()> {
        let valid = matches!(
            (self.status, to),
            (JobStatus::Running, JobStatus::Completed) | (JobStatus::Running, JobStatus::Failed)
        );

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!(
                    "Cannot transition from {} to {}",
                    self.status.as_str(),
                    to.as_str()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_result() -> SyncResult {
        let mut result = SyncResult::new("src", "out");
        result.processed = vec!["out/original/a.jpg".to_string()];
        result.skipped = vec!["out/original/b.png".to_string()];
        result
    }

    #[test]
    fn test_job_id_parsing() {
        let id = JobId::new();
        assert_eq!(JobId::from_string(&id.to_string()).unwrap(), id);
        assert!(matches!(
            JobId::from_string("not-a-uuid"),
            Err(SyncError::InvalidJobId(_))
        ));
        assert_eq!(serde_json::to_value(id).unwrap(), id.to_string());
    }

    #[test]
    fn test_new_job_is_running() {
        let job = Job::new("src", "out", Utc::now());
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.completed_at.is_none());
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn test_finish_completes() {
        let job = Job::new("src", "out", Utc::now())
            .finish(completed_result(), Utc::now())
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.processed, vec!["out/original/a.jpg"]);
        assert_eq!(job.skipped, vec!["out/original/b.png"]);
        assert_eq!(job.progress.phase, SyncPhase::Finished);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_finish_with_failed_result_fails_job() {
        let result = SyncResult::systemic_failure("src", "out", "listing failed");
        let job = Job::new("src", "out", Utc::now())
            .finish(result, Utc::now())
            .unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("listing failed"));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let job = Job::new("src", "out", Utc::now())
            .fail("boom", Utc::now())
            .unwrap();

        assert!(job.clone().fail("again", Utc::now()).is_err());
        assert!(job.clone().finish(completed_result(), Utc::now()).is_err());

        let mut job = job;
        assert!(job
            .update_progress(ProgressUpdate::new(SyncPhase::Generating))
            .is_err());
    }

    #[test]
    fn test_update_progress() {
        let mut job = Job::new("src", "out", Utc::now());
        job.update_progress(ProgressUpdate {
            total: 6,
            completed: 2,
            failed: 1,
            phase: SyncPhase::Generating,
        })
        .unwrap();

        assert_eq!(job.progress.total, 6);
        assert_eq!(job.progress.completed, 2);
        assert_eq!(job.progress.phase, SyncPhase::Generating);
    }

    #[test]
    fn test_job_wire_shape() {
        let job = Job::new("src", "out", Utc::now());
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["status"], "running");
        assert_eq!(value["job_id"], job.job_id.to_string());
        assert_eq!(value["progress"]["phase"], "listing");
        assert!(value["created_at"].is_string());
        assert!(value["completed_at"].is_null());
    }
}
