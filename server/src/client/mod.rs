//! FileMaker Server client.
//!
//! [`FileMakerServer`] turns each operation into one CWP request: it encodes
//! the query, sends it through a [`Transport`], and decodes the fmresultset
//! response. Nothing is retried or cached.

mod transport;

pub use transport::{Credentials, HttpTransport, Transport, TransportError};

use fmcwp_engine::{
    database_names_query, layout_info_query, layout_names_query, LayoutInfo, Query, ResultSet,
    FMRS_GRAMMAR,
};
use std::sync::Arc;

/// Field holding each name in a `-dbnames` response.
const DATABASE_NAME_FIELD: &str = "DATABASE_NAME";

/// Field holding each name in a `-layoutnames` response.
const LAYOUT_NAME_FIELD: &str = "LAYOUT_NAME";

/// Errors from a client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("FileMaker error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<fmcwp_engine::Error> for ClientError {
    fn from(err: fmcwp_engine::Error) -> Self {
        match err {
            fmcwp_engine::Error::Protocol(msg) => ClientError::Protocol(msg),
            fmcwp_engine::Error::Server { code, message } => ClientError::Server { code, message },
            fmcwp_engine::Error::InvalidQuery(msg) => ClientError::InvalidQuery(msg),
        }
    }
}

impl ClientError {
    /// FileMaker error code, for server errors.
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// A FileMaker Server reachable over CWP.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct FileMakerServer {
    host: String,
    port: u16,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl FileMakerServer {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            transport,
        }
    }

    /// The same server accessed with other credentials.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            credentials,
            ..self.clone()
        }
    }

    /// URL of the fmresultset endpoint. Port 443 uses https.
    pub fn endpoint(&self) -> String {
        let scheme = if self.port == 443 { "https" } else { "http" };
        format!(
            "{scheme}://{}:{}/fmi/xml/{FMRS_GRAMMAR}.xml",
            self.host, self.port
        )
    }

    async fn perform(&self, query_string: &str) -> Result<ResultSet> {
        let url = format!("{}?{}", self.endpoint(), query_string);
        tracing::debug!(%url, user = %self.credentials.username, "sending CWP request");

        let body = self
            .transport
            .get(&url, &self.credentials.basic_auth_header())
            .await
            .map_err(|e| {
                tracing::error!("FileMaker request failed: {}", e);
                e
            })?;

        if body.is_empty() {
            tracing::warn!("FileMaker returned an empty body");
            return Err(ClientError::Protocol("empty response body".into()));
        }

        ResultSet::from_bytes(&body).map_err(|e| {
            match &e {
                fmcwp_engine::Error::Server { code, message } => {
                    tracing::debug!(code, "FileMaker reported: {}", message)
                }
                _ => tracing::warn!("Failed to decode FileMaker response: {}", e),
            }
            e.into()
        })
    }

    /// Names of the databases hosted by the server.
    pub async fn database_names(&self) -> Result<Vec<String>> {
        let result = self.perform(&database_names_query()).await?;
        Ok(names(&result, DATABASE_NAME_FIELD))
    }

    /// Names of the layouts of `database`.
    pub async fn layout_names(&self, database: &str) -> Result<Vec<String>> {
        let result = self.perform(&layout_names_query(database)).await?;
        Ok(names(&result, LAYOUT_NAME_FIELD))
    }

    /// Field and portal definitions of a layout.
    pub async fn layout_info(&self, database: &str, layout: &str) -> Result<LayoutInfo> {
        let result = self.perform(&layout_info_query(database, layout)).await?;
        Ok(result.layout_info)
    }

    /// Run a query and return the decoded result set.
    pub async fn query(&self, query: &Query) -> Result<ResultSet> {
        let query_string = query.to_query_string()?;
        self.perform(&query_string).await
    }
}

impl std::fmt::Debug for FileMakerServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMakerServer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Text of `field` in every record, in record order.
fn names(result: &ResultSet, field: &str) -> Vec<String> {
    result
        .records
        .iter()
        .filter_map(|record| record.field(field))
        .map(|value| value.render(result.formats()))
        .collect()
}
