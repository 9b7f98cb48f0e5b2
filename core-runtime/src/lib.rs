//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the StyleSync workspace:
//! - Logging and tracing infrastructure
//! - Application configuration and validation
//!
//! ## Overview
//!
//! This crate contains the runtime utilities every other crate depends on. It
//! establishes the logging conventions and the validated configuration the
//! composition root wires adapters from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, AzureConfig, ProviderKind, StabilityConfig, StorageMode};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
