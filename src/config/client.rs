use crate::core::{ProbeError, Result};
use crate::modules::graphql::Headers;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// GraphQL endpoint and transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub endpoint: String,
    pub auth_header: String,
    pub auth_token: Option<String>,
    pub tenant_header: Option<String>,
    pub tenant_id: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_header: "Authorization".to_string(),
            auth_token: None,
            tenant_header: None,
            tenant_id: None,
            timeout_secs: 30,
            max_retries: 2,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(ClientConfig {
            endpoint: env::var("GQLPROBE_ENDPOINT")
                .map_err(|_| ProbeError::Configuration("GQLPROBE_ENDPOINT not set".to_string()))?,
            auth_header: env::var("GQLPROBE_AUTH_HEADER")
                .unwrap_or_else(|_| "Authorization".to_string()),
            auth_token: env::var("GQLPROBE_AUTH_TOKEN").ok(),
            tenant_header: env::var("GQLPROBE_TENANT_HEADER").ok(),
            tenant_id: env::var("GQLPROBE_TENANT_ID").ok(),
            timeout_secs: env::var("GQLPROBE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    ProbeError::Configuration("Invalid GQLPROBE_TIMEOUT_SECS".to_string())
                })?,
            max_retries: env::var("GQLPROBE_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| {
                    ProbeError::Configuration("Invalid GQLPROBE_MAX_RETRIES".to_string())
                })?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Headers sent with every request: credential and tenant
    pub fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(token) = &self.auth_token {
            headers.insert(self.auth_header.clone(), token.clone());
        }
        if let (Some(name), Some(value)) = (&self.tenant_header, &self.tenant_id) {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}
