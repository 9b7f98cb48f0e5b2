//! Umbrella crate for embedding StyleSync.
//!
//! Re-exports the composition root (`service`) or just the reconciliation
//! engine (`sync`) depending on the enabled features, so a host only needs
//! one dependency line.

#[cfg(feature = "local-shims")]
pub use core_service as service;

#[cfg(feature = "engine-only")]
pub use core_sync as sync;
