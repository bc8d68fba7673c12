use crate::core::{ProbeError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Settings shared by the conformance oracles
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    pub idempotency_header: String,
    pub default_page_size: u32,
    pub full_scan_limit: u32,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
    pub namespace_prefix: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            idempotency_header: "Idempotency-Key".to_string(),
            default_page_size: 25,
            full_scan_limit: 500,
            poll_interval_ms: 2000,
            poll_timeout_secs: 120,
            namespace_prefix: "e2e".to_string(),
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = OracleConfig::default();
        Ok(OracleConfig {
            idempotency_header: env::var("GQLPROBE_IDEMPOTENCY_HEADER")
                .unwrap_or(defaults.idempotency_header),
            default_page_size: parse_var("GQLPROBE_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            full_scan_limit: parse_var("GQLPROBE_FULL_SCAN_LIMIT", defaults.full_scan_limit)?,
            poll_interval_ms: parse_var("GQLPROBE_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            poll_timeout_secs: parse_var("GQLPROBE_POLL_TIMEOUT_SECS", defaults.poll_timeout_secs)?,
            namespace_prefix: env::var("GQLPROBE_NAMESPACE_PREFIX")
                .unwrap_or(defaults.namespace_prefix),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ProbeError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}
