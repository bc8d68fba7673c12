use async_trait::async_trait;

use crate::core::Result;
use crate::modules::graphql::models::{GraphqlResponse, Headers, Operation};

/// Issues a single GraphQL request and returns the decoded exchange
///
/// Implementations report network failures as `ProbeError::Transport`. Any
/// HTTP status, including 4xx/5xx, is a successful exchange from the
/// transport's point of view and is returned for the caller to judge.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Post query text with per-request headers layered over the transport defaults
    async fn post(&self, query: &str, headers: &Headers) -> Result<GraphqlResponse>;

    /// Render and post an operation
    async fn execute(&self, operation: &Operation, headers: &Headers) -> Result<GraphqlResponse> {
        self.post(&operation.render(), headers).await
    }
}
