//! Route configuration.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers::{get_logs, get_logs_json, health_check, rebuild_index};
use crate::state::WebState;

/// Create the query router.
pub fn create_router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/logs", get(get_logs))
        .route("/logs.json", get(get_logs_json))
        .route("/index/rebuild", post(rebuild_index))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
