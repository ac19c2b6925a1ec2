//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use super::handlers::{logs, search, sessions, status};
use super::middleware::request_context_middleware;
use super::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/sources", get(status::sources))
    .route("/logs", get(logs::get_logs))
    // Conversation endpoints
    .route("/sessions", get(sessions::list_sessions))
    .route("/sessions/{id}/messages", post(sessions::send_message))
    .route("/sessions/{id}/history", get(sessions::get_history))
    .route("/search", post(search::search))
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
