use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_traits::BridgeError;
use core_sync::SyncError;
use serde_json::json;
use tracing::warn;

/// Error returned by route handlers, rendered as `{ "error": "<message>" }`
#[derive(Debug)]
pub enum ApiError {
    Sync(SyncError),
    Storage(BridgeError),
    NotFound(String),
    BadRequest(String),
    Unauthorized,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Sync(SyncError::JobNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Sync(SyncError::InvalidJobId(_))
            | ApiError::Sync(SyncError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Sync(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Sync(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Sync(e) => e.to_string(),
            ApiError::Storage(e) => e.to_string(),
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Unauthorized => "Invalid or missing API key".to_string(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(error: SyncError) -> Self {
        ApiError::Sync(error)
    }
}

impl From<BridgeError> for ApiError {
    fn from(error: BridgeError) -> Self {
        ApiError::Storage(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            warn!("Request failed: {message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
