//! # Reconciliation Engine
//!
//! Converges the styled output tree toward the state implied by the source
//! images and the style catalog.
//!
//! ## Workflow
//!
//! 1. List source images under the source prefix
//! 2. Compute the expected targets (one original copy plus one per style)
//! 3. List managed outputs under the output prefix
//! 4. Diff into missing, skipped and orphaned
//! 5. Materialize missing targets with bounded concurrency
//! 6. Delete orphans, best effort
//!
//! Listing failures abort the run with `status = failed`. Everything after
//! that is per item: a failed task lands in `failed` and the run continues.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{EngineConfig, ReconciliationEngine};
//!
//! let engine = ReconciliationEngine::new(storage, generator, catalog, EngineConfig::default());
//! let result = engine.process_sync("uploads", "styled", None).await;
//! println!("created {} outputs", result.processed.len());
//! ```

use crate::{
    plan::{build_plan, select_managed_outputs, select_sources, SyncTask},
    progress::{ProgressSink, ProgressUpdate, SyncPhase},
    result::{FailedItem, SyncResult},
    styles::StyleCatalog,
    Result,
};
use bridge_traits::{
    storage::{folder_prefix, trim_path},
    GenerationError, ImageGenerator, StorageProvider,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum in-flight tasks per run
    pub max_concurrent: usize,
    /// Per-call bound on the image provider
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            generation_timeout: Duration::from_secs(120),
        }
    }
}

/// Outcome of a single task
enum TaskOutcome {
    Written,
    Failed(String),
}

/// Reconciles an output tree against sources and the style catalog
pub struct ReconciliationEngine {
    storage: Arc<dyn StorageProvider>,
    generator: Arc<dyn ImageGenerator>,
    catalog: Arc<StyleCatalog>,
    config: EngineConfig,
}

impl ReconciliationEngine {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        generator: Arc<dyn ImageGenerator>,
        catalog: Arc<StyleCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            storage,
            generator,
            catalog,
            config,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    pub fn catalog(&self) -> &Arc<StyleCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one reconciliation pass
    ///
    /// Never returns an error: systemic failures are reported through
    /// `SyncResult::status` and `SyncResult::error`.
    #[instrument(skip(self, progress), fields(source = %source_prefix, output = %output_prefix))]
    pub async fn process_sync(
        &self,
        source_prefix: &str,
        output_prefix: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> SyncResult {
        let source = trim_path(source_prefix);
        let output = trim_path(output_prefix);

        report(&progress, ProgressUpdate::new(SyncPhase::Listing)).await;

        info!("Phase 1: Listing source and output files");
        let (sources, actual) = match self.list_state(source, output).await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Sync aborted while listing storage");
                report(&progress, ProgressUpdate::new(SyncPhase::Finished)).await;
                return SyncResult::systemic_failure(source, output, e.to_string());
            }
        };

        info!("Phase 2: Computing expected state");
        let plan = build_plan(&sources, &actual, output, &self.catalog);
        info!(
            sources = sources.len(),
            expected = plan.expected.len(),
            missing = plan.missing.len(),
            skipped = plan.skipped.len(),
            orphaned = plan.orphaned.len(),
            "Computed sync plan"
        );

        let mut result = SyncResult::new(source, output);
        result.skipped = plan.skipped;

        info!("Phase 3: Materializing {} missing files", plan.missing.len());
        let mut update = ProgressUpdate {
            total: plan.missing.len(),
            completed: 0,
            failed: 0,
            phase: SyncPhase::Generating,
        };
        report(&progress, update).await;

        for (task, outcome) in self.run_tasks(plan.missing, &progress, &mut update).await {
            match outcome {
                TaskOutcome::Written => result.processed.push(task.target_path),
                TaskOutcome::Failed(message) => result.failed.push(FailedItem {
                    path: task.target_path,
                    error: message,
                }),
            }
        }

        info!("Phase 4: Deleting {} orphaned files", plan.orphaned.len());
        update.phase = SyncPhase::Deleting;
        report(&progress, update).await;
        result.deleted = self.delete_orphans(plan.orphaned).await;

        update.phase = SyncPhase::Finished;
        report(&progress, update).await;

        info!(
            processed = result.processed.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            deleted = result.deleted.len(),
            "Sync completed"
        );
        result
    }

    async fn list_state(
        &self,
        source: &str,
        output: &str,
    ) -> Result<(Vec<String>, std::collections::BTreeSet<String>)> {
        let source_listing = self.storage.list(&folder_prefix(source)).await?;
        let sources = select_sources(&source_listing, output, &self.catalog);
        debug!(
            listed = source_listing.len(),
            images = sources.len(),
            "Listed source images"
        );

        let output_listing = self.storage.list(&folder_prefix(output)).await?;
        let actual = select_managed_outputs(&output_listing, output, &self.catalog);
        debug!(
            listed = output_listing.len(),
            managed = actual.len(),
            "Listed managed outputs"
        );

        Ok((sources, actual))
    }

    /// Execute tasks with bounded concurrency, keeping planning order
    async fn run_tasks(
        &self,
        tasks: Vec<SyncTask>,
        progress: &Option<Arc<dyn ProgressSink>>,
        update: &mut ProgressUpdate,
    ) -> Vec<(SyncTask, TaskOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let storage = Arc::clone(&self.storage);
            let generator = Arc::clone(&self.generator);
            let generation_timeout = self.config.generation_timeout;
            let spawned = task.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(format!("Worker pool closed: {}", e)),
                };
                execute_task(storage.as_ref(), generator.as_ref(), &spawned, generation_timeout)
                    .await
                    .map_err(|e| e.to_string())
            });
            handles.push((task, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (task, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(())) => {
                    debug!(target_path = %task.target_path, "Materialized output");
                    update.completed += 1;
                    TaskOutcome::Written
                }
                Ok(Err(message)) => {
                    warn!(
                        target_path = %task.target_path,
                        error = %message,
                        "Sync task failed"
                    );
                    update.failed += 1;
                    TaskOutcome::Failed(message)
                }
                Err(e) => {
                    error!(target_path = %task.target_path, error = %e, "Sync task panicked");
                    update.failed += 1;
                    TaskOutcome::Failed(format!("Task aborted: {}", e))
                }
            };
            report(progress, *update).await;
            outcomes.push((task, outcome));
        }

        outcomes
    }

    /// Delete orphans sequentially; failures are logged and left in place
    async fn delete_orphans(&self, orphaned: Vec<String>) -> Vec<String> {
        let mut deleted = Vec::with_capacity(orphaned.len());
        for path in orphaned {
            match self.storage.delete(&path).await {
                Ok(()) => {
                    debug!(path = %path, "Deleted orphaned output");
                    deleted.push(path);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to delete orphaned output");
                }
            }
        }
        deleted
    }
}

/// Read the source, produce the target bytes and write them
async fn execute_task(
    storage: &dyn StorageProvider,
    generator: &dyn ImageGenerator,
    task: &SyncTask,
    generation_timeout: Duration,
) -> Result<()> {
    let source = storage.read(&task.source_path).await?;

    let data = match &task.style {
        None => source,
        Some(style) => {
            let generated = timeout(
                generation_timeout,
                generator.process_image_bytes(
                    source,
                    task.file_name(),
                    &style.prompt_text,
                    style.strength,
                ),
            )
            .await
            .map_err(|_| GenerationError::Timeout(generation_timeout.as_secs()))??;

            validate_image(&generated)?;
            generated
        }
    };

    storage.write(&task.target_path, data).await?;
    Ok(())
}

/// Reject payloads that are empty or not a recognizable image
pub fn validate_image(data: &Bytes) -> std::result::Result<(), GenerationError> {
    if data.is_empty() {
        return Err(GenerationError::EmptyResponse(
            "provider returned zero bytes".to_string(),
        ));
    }
    image::guess_format(data)
        .map(|_| ())
        .map_err(|e| GenerationError::InvalidImage(e.to_string()))
}

async fn report(progress: &Option<Arc<dyn ProgressSink>>, update: ProgressUpdate) {
    if let Some(sink) = progress {
        sink.report(update).await;
    }
}
