//! # Stability AI Provider
//!
//! Implements `ImageGenerator` for the Stability AI v1 image-to-image API.
//!
//! ## Overview
//!
//! This module provides:
//! - Multipart image-to-image requests with bearer authentication
//! - Mapping of style strength onto the API's `image_strength`
//! - Content filter detection and error mapping into `GenerationError`

pub mod error;
pub mod generator;
pub mod types;

pub use error::{Result, StabilityError};
pub use generator::{image_strength, StabilityGenerator};
