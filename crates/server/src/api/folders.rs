//! Folder API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use dropsort_core::{MonitoredFolder, NewFolder};
use serde::Serialize;
use std::sync::Arc;

use super::error::{operation_response, ApiError};
use crate::state::AppState;

/// Response for listing folders
#[derive(Debug, Serialize)]
pub struct ListFoldersResponse {
    pub folders: Vec<MonitoredFolder>,
    pub total: usize,
}

/// Register a folder (monitoring starts off)
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewFolder>, JsonRejection>,
) -> Result<(StatusCode, Json<MonitoredFolder>), ApiError> {
    // Bad rules fail during deserialization; report them as validation errors.
    let Json(request) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let folder = state.engine().add_folder(request).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn list_folders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListFoldersResponse>, ApiError> {
    let folders = state.engine().list_folders()?;
    Ok(Json(ListFoldersResponse {
        total: folders.len(),
        folders,
    }))
}

pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonitoredFolder>, ApiError> {
    state
        .engine()
        .get_folder(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Folder not found: {id}")))
}

/// Stop monitoring (if active) and delete the folder
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonitoredFolder>, ApiError> {
    let folder = state.engine().remove_folder(&id).await?;
    Ok(Json(folder))
}

pub async fn start_monitoring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    operation_response(state.engine().start_monitoring(&id).await)
}

pub async fn stop_monitoring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    operation_response(state.engine().stop_monitoring(&id).await)
}
