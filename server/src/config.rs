//! Configuration management for the server.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// FileMaker Server host name
    pub fm_host: String,
    /// FileMaker Server port (443 selects https)
    pub fm_port: u16,
    /// Default FileMaker account
    pub fm_username: String,
    pub fm_password: String,
    /// Timeout for each FileMaker request
    pub fm_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort("PORT"))?;

        let fm_host = lookup("FM_HOST").ok_or(ConfigError::MissingFmHost)?;

        let fm_port = lookup("FM_PORT")
            .unwrap_or_else(|| "80".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort("FM_PORT"))?;

        let fm_username = lookup("FM_USERNAME").unwrap_or_default();
        let fm_password = lookup("FM_PASSWORD").unwrap_or_default();

        let fm_timeout = lookup("FM_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            host,
            port,
            fm_host,
            fm_port,
            fm_username,
            fm_password,
            fm_timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FM_HOST environment variable is required")]
    MissingFmHost,

    #[error("Invalid {0} value")]
    InvalidPort(&'static str),

    #[error("Invalid FM_TIMEOUT_SECS value")]
    InvalidTimeout,
}
