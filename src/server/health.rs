//! Liveness and build-info endpoints.

use axum::extract::State;

use super::AppState;

/// Index page: identifies the running build.
pub async fn index_handler(State(state): State<AppState>) -> String {
    tracing::info!("index");
    format!("works: {}", state.commit_info().unwrap_or("unknown"))
}

/// Health check for liveness probes.
pub async fn health_handler() -> &'static str {
    "ok"
}
