//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// FileMaker Server endpoint the gateway forwards to.
    pub upstream: String,
    /// Timeout applied to each FileMaker request.
    pub upstream_timeout_secs: u64,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler. Does not contact FileMaker Server.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: state.server.endpoint(),
        upstream_timeout_secs: state.config.fm_timeout.as_secs(),
    })
}

/// Root handler.
async fn root() -> &'static str {
    "FileMaker CWP Gateway"
}
