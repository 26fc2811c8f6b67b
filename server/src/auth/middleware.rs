//! Credential extraction.
//!
//! A request may carry its own `Authorization: Basic` header, which is
//! forwarded to FileMaker Server instead of the configured account. Requests
//! without the header use the configured account.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::client::{Credentials, FileMakerServer};
use crate::error::AppError;
use crate::AppState;

/// FileMaker credentials supplied by the caller, if any.
#[derive(Debug, Clone)]
pub struct FmCredentials(pub Option<Credentials>);

impl FmCredentials {
    /// The configured server, switched to the caller's credentials if given.
    pub fn server(self, state: &AppState) -> FileMakerServer {
        match self.0 {
            Some(credentials) => state.server.with_credentials(credentials),
            None => state.server.clone(),
        }
    }
}

impl FromRequestParts<AppState> for FmCredentials {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(AUTHORIZATION);

        match auth_header {
            None => Ok(FmCredentials(None)),
            Some(value) => {
                let header = value.to_str().map_err(|_| AppError::Unauthorized)?;
                match Credentials::from_basic_auth_header(header) {
                    Some(credentials) => Ok(FmCredentials(Some(credentials))),
                    None => {
                        tracing::debug!("Rejecting malformed authorization header");
                        Err(AppError::Unauthorized)
                    }
                }
            }
        }
    }
}
