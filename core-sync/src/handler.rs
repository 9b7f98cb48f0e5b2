//! # Sync Request Handler
//!
//! Entry points for synchronous and asynchronous sync requests. Resolves
//! omitted prefixes against process defaults, normalizes them, then either
//! runs the engine inline or hands the run to the job registry.

use crate::{
    engine::ReconciliationEngine,
    job::{Job, JobId},
    registry::JobRegistry,
    result::SyncResult,
    Result, SyncError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Body of a sync request; both fields fall back to configured defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl SyncRequest {
    pub fn new(source_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            output_path: Some(output_path.into()),
        }
    }
}

/// Normalize a storage prefix
///
/// Strips surrounding whitespace and slashes and collapses repeated
/// separators. `.` segments are dropped.
///
/// # Errors
///
/// Returns `SyncError::InvalidInput` for `..` segments.
pub fn normalize_prefix(field: &str, raw: &str) -> Result<String> {
    let mut segments = Vec::new();
    for segment in raw.trim().split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(SyncError::InvalidInput {
                    field: field.to_string(),
                    message: format!("'{}' must not contain '..' segments", raw),
                })
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

pub struct SyncRequestHandler {
    engine: Arc<ReconciliationEngine>,
    registry: JobRegistry,
    default_source: String,
    default_output: String,
}

impl SyncRequestHandler {
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        registry: JobRegistry,
        default_source: impl Into<String>,
        default_output: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            registry,
            default_source: default_source.into(),
            default_output: default_output.into(),
        }
    }

    pub fn engine(&self) -> &Arc<ReconciliationEngine> {
        &self.engine
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Output prefix applied when a request leaves it out
    pub fn default_output(&self) -> &str {
        &self.default_output
    }

    /// Resolve and validate the `(source, output)` prefixes of a request
    pub fn resolve(&self, request: &SyncRequest) -> Result<(String, String)> {
        let source = pick(&request.source_path, &self.default_source);
        let output = pick(&request.output_path, &self.default_output);

        let source = normalize_prefix("source_path", source)?;
        let output = normalize_prefix("output_path", output)?;

        if source == output {
            return Err(SyncError::InvalidInput {
                field: "output_path".to_string(),
                message: format!(
                    "output path '{}' must differ from the source path",
                    output
                ),
            });
        }

        Ok((source, output))
    }

    /// Run a reconciliation inline
    #[instrument(skip(self))]
    pub async fn sync(&self, request: SyncRequest) -> Result<SyncResult> {
        let (source, output) = self.resolve(&request)?;
        info!(source = %source, output = %output, "Running sync");
        Ok(self.engine.process_sync(&source, &output, None).await)
    }

    /// Schedule a reconciliation and return its job ID
    #[instrument(skip(self))]
    pub async fn start_async(&self, request: SyncRequest) -> Result<JobId> {
        let (source, output) = self.resolve(&request)?;
        Ok(self
            .registry
            .start(Arc::clone(&self.engine), &source, &output)
            .await)
    }

    /// Look up a job by its textual ID
    ///
    /// # Errors
    ///
    /// `InvalidJobId` when the ID is not a UUID, `JobNotFound` when unknown.
    pub async fn job_status(&self, job_id: &str) -> Result<Job> {
        let job_id = JobId::from_string(job_id)?;
        self.registry.get_status(job_id).await
    }
}

fn pick<'a>(requested: &'a Option<String>, default: &'a str) -> &'a str {
    match requested.as_deref() {
        Some(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("f", "src/").unwrap(), "src");
        assert_eq!(normalize_prefix("f", "/a//b/").unwrap(), "a/b");
        assert_eq!(normalize_prefix("f", " ./uploads ").unwrap(), "uploads");
        assert_eq!(normalize_prefix("f", "").unwrap(), "");
        assert_eq!(normalize_prefix("f", "/").unwrap(), "");

        let err = normalize_prefix("source_path", "a/../b").unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput { field, .. } if field == "source_path"));
    }

    #[test]
    fn test_pick_prefers_non_blank_request() {
        assert_eq!(pick(&Some("in".to_string()), "default"), "in");
        assert_eq!(pick(&Some("  ".to_string()), "default"), "default");
        assert_eq!(pick(&None, "default"), "default");
    }

    #[test]
    fn test_request_deserializes_partial_body() {
        let request: SyncRequest = serde_json::from_str(r#"{ "source_path": "src" }"#).unwrap();
        assert_eq!(request.source_path.as_deref(), Some("src"));
        assert!(request.output_path.is_none());

        let empty: SyncRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SyncRequest::default());
    }
}
