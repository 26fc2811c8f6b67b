//! FileMaker CWP Gateway - JSON over HTTP in front of FileMaker Server.
//!
//! The gateway turns JSON requests into Custom Web Publishing queries using
//! the fmcwp-engine encoder, forwards them to FileMaker Server, and returns
//! the decoded fmresultset as JSON.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

use crate::client::FileMakerServer;
use crate::config::Config;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub server: FileMakerServer,
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
