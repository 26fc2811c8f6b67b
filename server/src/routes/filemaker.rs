//! FileMaker endpoint routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::auth::FmCredentials;
use crate::error::Result;
use crate::handlers::{
    handle_databases, handle_layout_info, handle_layouts, handle_query, DatabasesResponse,
    FieldNamesResponse, LayoutsResponse, QueryRequest,
};
use crate::AppState;

/// Create FileMaker routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/databases", get(databases_handler))
        .route("/databases/{database}/layouts", get(layouts_handler))
        .route(
            "/databases/{database}/layouts/{layout}",
            get(layout_info_handler),
        )
        .route(
            "/databases/{database}/layouts/{layout}/query",
            post(query_handler),
        )
}

/// GET /databases - List hosted databases.
async fn databases_handler(
    State(state): State<AppState>,
    credentials: FmCredentials,
) -> Result<Json<DatabasesResponse>> {
    let server = credentials.server(&state);
    Ok(Json(handle_databases(&server).await?))
}

/// GET /databases/{database}/layouts - List layouts of a database.
async fn layouts_handler(
    State(state): State<AppState>,
    credentials: FmCredentials,
    Path(database): Path<String>,
) -> Result<Json<LayoutsResponse>> {
    let server = credentials.server(&state);
    Ok(Json(handle_layouts(&server, &database).await?))
}

/// GET /databases/{database}/layouts/{layout} - List the fields of a layout.
async fn layout_info_handler(
    State(state): State<AppState>,
    credentials: FmCredentials,
    Path((database, layout)): Path<(String, String)>,
) -> Result<Json<FieldNamesResponse>> {
    let server = credentials.server(&state);
    Ok(Json(handle_layout_info(&server, &database, &layout).await?))
}

/// POST /databases/{database}/layouts/{layout}/query - Run a query.
async fn query_handler(
    State(state): State<AppState>,
    credentials: FmCredentials,
    Path((database, layout)): Path<(String, String)>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Value>> {
    let server = credentials.server(&state);
    Ok(Json(handle_query(&server, &database, &layout, request).await?))
}
