//! # Native Bridge Implementations
//!
//! Default implementations of the bridge traits for the StyleSync server.
//!
//! ## Overview
//!
//! - `StorageProvider` backed by a local directory (`LocalFileStorage`)
//! - `StorageProvider` backed by process memory (`InMemoryStorage`)
//! - `HttpClient` using `reqwest` (`ReqwestHttpClient`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LocalFileStorage, ReqwestHttpClient};
//! use std::time::Duration;
//!
//! let storage = LocalFileStorage::new("local_storage").await?;
//! let http = ReqwestHttpClient::new(Duration::from_secs(120))?;
//! ```

mod filesystem;
mod http;
mod memory;

pub use filesystem::LocalFileStorage;
pub use http::ReqwestHttpClient;
pub use memory::InMemoryStorage;
