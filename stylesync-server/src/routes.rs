use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bridge_traits::storage::{file_name, folder_prefix, guess_mime_type, join_path, parent_folder};
use bytes::Bytes;
use core_service::StyleSyncService;
use core_sync::handler::normalize_prefix;
use core_sync::plan::is_source_image;
use core_sync::{SyncRequest, SyncStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::require_api_key;
use crate::error::ApiError;

pub struct AppState {
    pub service: StyleSyncService,
    /// Required `X-API-Key` value; `None` disables the check
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(service: StyleSyncService, api_key: Option<String>) -> Self {
        Self { service, api_key }
    }
}

#[derive(Deserialize)]
struct StyleImagesQuery {
    output_path: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/files", get(list_files).post(upload_file))
        .route("/files/*path", get(read_file).delete(delete_file))
        .route("/folders/*path", delete(delete_folder))
        .route("/styles", get(list_styles))
        .route("/styles/:name/images", get(style_images))
        .route("/stylesync", post(run_sync))
        .route("/stylesync/async", post(start_sync))
        .route("/stylesync/jobs/:job_id", get(job_status))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_api_key,
        ))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to StyleSync. POST /stylesync to reconcile styled images."
    }))
}

async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let files = state.service.storage().list("").await?;
    Ok(Json(json!({ "files": files })))
}

async fn read_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.service.storage().read(&path).await?;
    Ok(([(header::CONTENT_TYPE, guess_mime_type(&path))], data).into_response())
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut folder = String::new();
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name().map(str::to_string).as_deref() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(|name| file_name(name).to_string())
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ApiError::BadRequest("file field has no filename".into()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                upload = Some((name, data));
            }
            Some("path") => {
                folder = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let Some((name, data)) = upload else {
        return Err(ApiError::BadRequest("missing multipart field 'file'".into()));
    };

    let folder = normalize_prefix("path", &folder)?;
    let filename = join_path(&[folder.as_str(), name.as_str()]);
    let storage = state.service.storage();
    storage.write(&filename, data).await?;

    info!("Uploaded {filename}");
    Ok(Json(json!({
        "filename": filename,
        "status": "uploaded",
        "mode": storage.mode(),
    })))
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.storage().delete(&path).await?;
    Ok(Json(json!({ "filename": path, "status": "deleted" })))
}

async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let folder = normalize_prefix("folder", &path)?;
    if folder.is_empty() {
        return Err(ApiError::BadRequest("refusing to delete the storage root".into()));
    }

    let deleted = state.service.storage().delete_prefix(&folder).await?;
    info!("Deleted {} files under {folder}", deleted.len());
    Ok(Json(json!({
        "folder": folder,
        "deleted_count": deleted.len(),
        "deleted_files": deleted,
    })))
}

async fn list_styles(State(state): State<Arc<AppState>>) -> Json<Value> {
    let catalog = state.service.catalog();
    Json(json!({ "styles": catalog.styles() }))
}

async fn style_images(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<StyleImagesQuery>,
) -> Result<Json<Value>, ApiError> {
    let catalog = state.service.catalog();
    let style = catalog
        .find_by_name(&name)
        .ok_or_else(|| ApiError::NotFound(format!("Style '{name}' not found")))?;

    let handler = state.service.handler();
    let output = match query.output_path.as_deref() {
        Some(path) if !path.trim().is_empty() => path,
        _ => handler.default_output(),
    };
    let output = normalize_prefix("output_path", output)?;
    let folder = join_path(&[output.as_str(), style.folder_token.as_str()]);

    let images: Vec<String> = state
        .service
        .storage()
        .list(&folder_prefix(&folder))
        .await?
        .into_iter()
        .filter(|path| parent_folder(path) == folder && is_source_image(path))
        .collect();

    Ok(Json(json!({
        "style": style.name,
        "folder": folder,
        "images": images,
    })))
}

async fn run_sync(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SyncRequest>>,
) -> Result<Response, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let result = state.service.handler().sync(request).await?;

    let status = match result.status {
        SyncStatus::Completed => StatusCode::OK,
        SyncStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Ok((status, Json(result)).into_response())
}

async fn start_sync(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SyncRequest>>,
) -> Result<Response, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let job_id = state.service.handler().start_async(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": job_id, "status": "running" })),
    )
        .into_response())
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let job = state.service.handler().job_status(&job_id).await?;
    Ok(Json(job).into_response())
}
