//! Incremental progress reporting for running syncs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stage of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Listing,
    Generating,
    Deleting,
    Finished,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Listing => "listing",
            SyncPhase::Generating => "generating",
            SyncPhase::Deleting => "deleting",
            SyncPhase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of task counts within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Tasks the run has to execute
    pub total: usize,
    /// Tasks finished successfully so far
    pub completed: usize,
    /// Tasks finished with an error so far
    pub failed: usize,
    pub phase: SyncPhase,
}

impl ProgressUpdate {
    pub fn new(phase: SyncPhase) -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            phase,
        }
    }

    /// Tasks finished either way
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}

/// Receiver for progress snapshots
///
/// The async job path installs one that writes into the job record; the
/// synchronous path passes none.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, update: ProgressUpdate);
}
