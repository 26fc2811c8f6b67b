//! Name listings: databases, layouts and layout fields.

use crate::client::FileMakerServer;
use crate::error::Result;
use serde::Serialize;

/// Response listing hosted databases.
#[derive(Debug, Serialize)]
pub struct DatabasesResponse {
    pub databases: Vec<String>,
}

/// Response listing the layouts of a database.
#[derive(Debug, Serialize)]
pub struct LayoutsResponse {
    pub layouts: Vec<String>,
}

/// Response listing the field names of a layout, in layout order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNamesResponse {
    pub field_names: Vec<String>,
}

pub async fn handle_databases(server: &FileMakerServer) -> Result<DatabasesResponse> {
    let databases = server.database_names().await?;
    Ok(DatabasesResponse { databases })
}

pub async fn handle_layouts(server: &FileMakerServer, database: &str) -> Result<LayoutsResponse> {
    let layouts = server.layout_names(database).await?;
    Ok(LayoutsResponse { layouts })
}

pub async fn handle_layout_info(
    server: &FileMakerServer,
    database: &str,
    layout: &str,
) -> Result<FieldNamesResponse> {
    let info = server.layout_info(database, layout).await?;
    Ok(FieldNamesResponse {
        field_names: info.field_names(),
    })
}
