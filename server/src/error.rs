//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fmcwp_engine::error::{NO_RECORDS_MATCH, RECORD_MISSING};
use serde::Serialize;

use crate::client::ClientError;

/// FileMaker code for a failed sign-in.
const INVALID_ACCOUNT: i32 = 212;

/// FileMaker codes for missing files and layouts.
const FILE_MISSING: i32 = 100;
const LAYOUT_MISSING: i32 = 105;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("FileMaker error: {0}")]
    Client(#[from] ClientError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match &self {
            AppError::Client(ClientError::Transport(e)) => {
                tracing::error!("Transport error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "FileMaker Server unreachable".to_string(),
                    None,
                    Some(e.to_string()),
                )
            }
            AppError::Client(ClientError::Protocol(msg)) => {
                tracing::warn!("Protocol error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Invalid response from FileMaker Server".to_string(),
                    None,
                    Some(msg.clone()),
                )
            }
            AppError::Client(ClientError::Server { code, message }) => {
                let status = match *code {
                    NO_RECORDS_MATCH | RECORD_MISSING | FILE_MISSING | LAYOUT_MISSING => {
                        StatusCode::NOT_FOUND
                    }
                    INVALID_ACCOUNT => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, message.clone(), Some(*code), None)
            }
            AppError::Client(ClientError::InvalidQuery(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone(), None, None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                None,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
