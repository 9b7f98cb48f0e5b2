//! HTTP layer for StyleSync.
//!
//! Routes are built by [`create_router`] around a shared [`AppState`]; the
//! binary only parses arguments, initializes logging and serves the router.

pub mod args;
pub mod auth;
pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{create_router, AppState};
