//! HTTP transport for CWP requests.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::time::Duration;

/// Account used to sign in to FileMaker Server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header for these credentials.
    pub fn basic_auth_header(&self) -> String {
        let login = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64.encode(login.as_bytes()))
    }

    /// Parse an `Authorization: Basic ...` header value.
    pub fn from_basic_auth_header(header: &str) -> Option<Self> {
        let encoded = header.strip_prefix("Basic ")?.trim();
        let decoded = BASE64.decode(encoded).ok()?;
        let login = String::from_utf8(decoded).ok()?;
        let (username, password) = login.split_once(':')?;
        Some(Self::new(username, password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Performs a GET request and returns the raw response body.
///
/// HTTP status codes are not interpreted: FileMaker reports its own error code
/// inside the body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, authorization: &str) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, authorization: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;
        tracing::debug!(status = %response.status(), "FileMaker responded");
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
