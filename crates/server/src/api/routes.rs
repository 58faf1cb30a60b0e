use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{actions, folders, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Folders
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/{id}",
            get(folders::get_folder).delete(folders::delete_folder),
        )
        .route("/folders/{id}/start", post(folders::start_monitoring))
        .route("/folders/{id}/stop", post(folders::stop_monitoring))
        // Moves and history
        .route("/moves", post(actions::request_move))
        .route("/actions", get(actions::list_actions))
        .route("/actions/{id}", get(actions::get_action))
        .route("/actions/{id}/revert", post(actions::revert_action));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
