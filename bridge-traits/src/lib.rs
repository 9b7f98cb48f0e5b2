//! # Host Bridge Traits
//!
//! Port abstractions the StyleSync core consumes but does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the reconciliation core and the
//! concrete adapters it runs against. Each trait represents a capability the
//! core requires but that has more than one implementation (local disk vs.
//! in-memory storage, Azure vs. Stability image generation).
//!
//! ## Traits
//!
//! ### Storage
//! - [`StorageProvider`](storage::StorageProvider) - Byte store keyed by `/`-separated paths
//!
//! ### Image generation
//! - [`ImageGenerator`](generation::ImageGenerator) - Source bytes + prompt + strength → styled bytes
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-attempt HTTP with multipart bodies and timeouts
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! Storage and transport use [`BridgeError`](error::BridgeError); generation
//! uses [`GenerationError`](generation::GenerationError), which wraps transport
//! failures. Implementations should:
//!
//! - Convert backend-specific errors to these types
//! - Report missing objects as `BridgeError::NotFound`
//! - Include context (paths, HTTP status, provider message)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared across spawned tasks behind an `Arc`.

pub mod error;
pub mod generation;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use generation::{GenerationError, GenerationResult, ImageGenerator};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
pub use storage::StorageProvider;
pub use time::{Clock, LogLevel, SystemClock};
