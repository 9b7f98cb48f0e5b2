//! # StyleSync Core
//!
//! Reconciles a tree of styled images against its source images.
//!
//! ## Overview
//!
//! For every source image and every configured style the engine makes sure a
//! styled copy exists under the output prefix, plus an unmodified original
//! copy. Missing outputs are generated through an [`ImageGenerator`], outputs
//! whose source disappeared are deleted, and everything already in place is
//! skipped, so repeated runs converge and are idempotent.
//!
//! ## Components
//!
//! - **Style Catalog** (`styles`): validated style definitions and name lookup
//! - **Planning** (`plan`): pure expected-vs-actual diff
//! - **Reconciliation Engine** (`engine`): drives storage and generation
//! - **Job State Machine** (`job`): lifecycle of async runs
//! - **Job Registry** (`registry`): owns jobs and schedules background runs
//! - **Sync Request Handler** (`handler`): request defaults and validation
//!
//! [`ImageGenerator`]: bridge_traits::ImageGenerator

pub mod engine;
pub mod error;
pub mod handler;
pub mod job;
pub mod plan;
pub mod progress;
pub mod registry;
pub mod result;
pub mod styles;

pub use engine::{EngineConfig, ReconciliationEngine};
pub use error::{Result, SyncError};
pub use handler::{SyncRequest, SyncRequestHandler};
pub use job::{Job, JobId, JobProgress, JobStatus};
pub use plan::{SyncPlan, SyncTask};
pub use progress::{ProgressSink, ProgressUpdate, SyncPhase};
pub use registry::JobRegistry;
pub use result::{FailedItem, SyncResult, SyncStatus};
pub use styles::{StyleCatalog, StyleDefinition};
