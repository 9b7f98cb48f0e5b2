//! # Azure Blob Storage Provider
//!
//! Implements `StorageProvider` over the Azure Blob REST API, so the sync
//! engine and the upload endpoint can run against a blob container.
//!
//! ## Overview
//!
//! This module provides:
//! - Connection string parsing (account key, SAS token, local emulator)
//! - Shared Key request signing
//! - Container creation on startup
//! - Paged listing, block blob upload, download and delete
//!
//! Requests go through the `HttpClient` port, so every operation can be
//! exercised against a mock transport.

pub mod connection;
pub mod error;
pub mod storage;
pub mod types;

pub use connection::{BlobAccount, Credential};
pub use error::{AzureBlobError, Result};
pub use storage::AzureBlobStorage;
