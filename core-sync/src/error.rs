use bridge_traits::{BridgeError, GenerationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Sync job {job_id} not found")]
    JobNotFound { job_id: String },

    #[error("Invalid job ID: {0}")]
    InvalidJobId(String),

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

impl SyncError {
    /// Whether this error reports a missing stored object
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Storage(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
