//! Sync run results

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Result, SyncError};

/// Overall outcome of one reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// The run finished; individual items may still have failed
    Completed,
    /// Listing or another systemic step failed
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(SyncError::InvalidInput {
                field: "status".to_string(),
                message: format!("unknown sync status '{}'", s),
            }),
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A target that could not be materialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub path: String,
    pub error: String,
}

/// Structured report of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub status: SyncStatus,
    pub source: String,
    pub output: String,
    /// Targets created this run
    pub processed: Vec<String>,
    pub failed: Vec<FailedItem>,
    /// Targets that already existed
    pub skipped: Vec<String>,
    /// Orphans removed this run
    pub deleted: Vec<String>,
    pub error: Option<String>,
}

impl SyncResult {
    /// Empty completed result for a prefix pair
    pub fn new(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Completed,
            source: source.into(),
            output: output.into(),
            processed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            deleted: Vec::new(),
            error: None,
        }
    }

    /// Result for a run that aborted before doing any work
    pub fn systemic_failure(
        source: impl Into<String>,
        output: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: SyncStatus::Failed,
            error: Some(error.into()),
            ..Self::new(source, output)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SyncStatus::Completed
    }

    /// Paths of failed targets
    pub fn failed_paths(&self) -> Vec<&str> {
        self.failed.iter().map(|item| item.path.as_str()).collect()
    }
}
