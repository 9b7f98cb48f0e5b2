//! Optional `X-API-Key` check

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::routes::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without the configured key; `GET /` stays open
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    if request.method() == Method::GET && request.uri().path() == "/" {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided == Some(expected) {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}
