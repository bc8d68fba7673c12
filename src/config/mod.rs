use crate::core::{ProbeError, Result};
use serde::Deserialize;
use std::env;

pub mod client;
pub mod oracle;

pub use client::ClientConfig;
pub use oracle::OracleConfig;

/// Main probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub client: ClientConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            },
            client: ClientConfig::from_env()?,
            oracle: OracleConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = &self.client.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ProbeError::Configuration(format!(
                "GQLPROBE_ENDPOINT must be an http(s) URL, got '{}'",
                self.client.endpoint
            )));
        }

        if self.client.timeout_secs == 0 {
            return Err(ProbeError::Configuration(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.oracle.default_page_size == 0 {
            return Err(ProbeError::Configuration(
                "Default page size must be greater than 0".to_string(),
            ));
        }

        if self.oracle.full_scan_limit < self.oracle.default_page_size {
            return Err(ProbeError::Configuration(
                "Full scan limit must be at least the default page size".to_string(),
            ));
        }

        if self.oracle.poll_interval_ms == 0 || self.oracle.poll_timeout_secs == 0 {
            return Err(ProbeError::Configuration(
                "Poll interval and timeout must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.app.log_format.as_str(), "text" | "json") {
            return Err(ProbeError::Configuration(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.app.log_format
            )));
        }

        Ok(())
    }
}
