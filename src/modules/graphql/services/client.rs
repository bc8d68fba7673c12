use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::json;
use tracing::debug;

use super::transport::GraphqlTransport;
use crate::config::ClientConfig;
use crate::core::{ProbeError, Result};
use crate::modules::graphql::models::{GraphqlResponse, Headers};

/// HTTP GraphQL client
///
/// Applies a fixed request timeout and retries transient network failures
/// (connection errors, 5xx, 408, 429) with exponential backoff. GraphQL
/// errors and business failures are never retried.
pub struct GraphqlClient {
    client: ClientWithMiddleware,
    endpoint: String,
    default_headers: Headers,
}

impl GraphqlClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProbeError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            default_headers: config.default_headers(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn header_map(&self, extra: &Headers) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.default_headers.iter().chain(extra.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ProbeError::validation(format!("Invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| {
                    ProbeError::validation(format!("Invalid value for header '{}'", name))
                })?;
            map.insert(name, value);
        }
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(map)
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    async fn post(&self, query: &str, headers: &Headers) -> Result<GraphqlResponse> {
        let payload = serde_json::to_vec(&json!({ "query": query }))?;
        let header_map = self.header_map(headers)?;

        debug!(endpoint = %self.endpoint, query = %query, "Posting GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(header_map)
            .body(payload)
            .send()
            .await
            .map_err(|e| ProbeError::transport(query, format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| ProbeError::transport(query, format!("failed to read body: {}", e)))?;

        debug!(status, bytes = raw.len(), "GraphQL response received");

        Ok(GraphqlResponse::from_raw(status, raw))
    }
}
