//! # Azure AI Provider
//!
//! Implements `ImageGenerator` for Azure AI Foundry image edit deployments.
//!
//! ## Overview
//!
//! This module provides:
//! - Multipart image edit requests with bearer authentication
//! - Result decoding from inline base64 or a follow-up download URL
//! - Error mapping into `GenerationError`

pub mod error;
pub mod generator;
pub mod types;

pub use error::{AzureAiError, Result};
pub use generator::AzureAiGenerator;
