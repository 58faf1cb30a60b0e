//! Move and history API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use dropsort_core::{ActionFilter, ActionRecord, ActionStatus, ActionType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::error::{operation_response, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a one-off move
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub source_path: PathBuf,
    pub destination_dir: PathBuf,
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveAccepted {
    pub accepted: bool,
}

/// Query parameters for listing actions
#[derive(Debug, Deserialize)]
pub struct ListActionsParams {
    /// Maximum number of records to return
    pub limit: Option<i64>,
    /// Only records produced by this folder
    pub folder_id: Option<String>,
    /// `MOVE`, `RENAME_AND_MOVE`, `DELETE_DUPLICATE` or `ERROR`
    pub action_type: Option<String>,
    /// `COMPLETED` or `REVERTED`
    pub status: Option<String>,
}

/// Response for listing actions
#[derive(Debug, Serialize)]
pub struct ListActionsResponse {
    pub actions: Vec<ActionRecord>,
    pub limit: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a move. The outcome is recorded in history, not returned.
pub async fn request_move(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MoveRequest>,
) -> Result<(StatusCode, Json<MoveAccepted>), ApiError> {
    if body.source_path.as_os_str().is_empty() || body.destination_dir.as_os_str().is_empty() {
        return Err(ApiError::validation(
            "source_path and destination_dir are required",
        ));
    }

    tokio::spawn(async move {
        state
            .engine()
            .move_file(
                &body.source_path,
                &body.destination_dir,
                body.folder_id.as_deref(),
            )
            .await;
    });

    Ok((StatusCode::ACCEPTED, Json(MoveAccepted { accepted: true })))
}

/// List history, most recent first
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListActionsParams>,
) -> Result<Json<ListActionsResponse>, ApiError> {
    let limit = state.config().history.clamp(params.limit);
    let mut filter = ActionFilter::new().with_limit(limit);

    if let Some(folder_id) = params.folder_id {
        filter = filter.with_folder_id(folder_id);
    }
    if let Some(raw) = params.action_type.as_deref() {
        let action_type = ActionType::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown action type: {raw}")))?;
        filter = filter.with_action_type(action_type);
    }
    if let Some(raw) = params.status.as_deref() {
        let status = ActionStatus::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown status: {raw}")))?;
        filter = filter.with_status(status);
    }

    let actions = state.engine().query_actions(filter)?;
    Ok(Json(ListActionsResponse { actions, limit }))
}

pub async fn get_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ActionRecord>, ApiError> {
    state
        .engine()
        .get_action(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Action {id} not found")))
}

pub async fn revert_action(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    operation_response(state.engine().revert_action(id).await)
}
