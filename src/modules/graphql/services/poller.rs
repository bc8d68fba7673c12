use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::transport::GraphqlTransport;
use crate::config::OracleConfig;
use crate::core::{ProbeError, Result};
use crate::modules::assertions::value_at;
use crate::modules::graphql::models::{GraphqlResponse, Headers, Operation};

/// Verdict of one poll round
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision<T> {
    Done(T),
    Pending,
}

/// Re-issues a status query on a fixed interval until a terminal state or a deadline
///
/// Replaces fixed wall-clock waits for asynchronous settlement: the wait ends as
/// soon as the remote side reports a terminal state, and running out of time is
/// reported as `ProbeError::Timeout` instead of silently continuing.
pub struct Poller {
    transport: Arc<dyn GraphqlTransport>,
    interval: Duration,
    timeout: Duration,
    headers: Headers,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            interval,
            timeout,
            headers: Headers::new(),
        }
    }

    pub fn from_config(transport: Arc<dyn GraphqlTransport>, config: &OracleConfig) -> Self {
        Self::new(transport, config.poll_interval(), config.poll_timeout())
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Poll `operation` until `decide` returns `Done`
    ///
    /// Transport errors are retried until the deadline. An error returned by
    /// `decide` aborts polling immediately.
    pub async fn until<T, F>(&self, what: &str, operation: &Operation, mut decide: F) -> Result<T>
    where
        F: FnMut(&GraphqlResponse) -> Result<PollDecision<T>>,
    {
        let query = operation.render();
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let last_response = match self.transport.post(&query, &self.headers).await {
                Ok(response) => {
                    if let PollDecision::Done(value) = decide(&response)? {
                        info!(
                            what,
                            attempts,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Poll reached terminal state"
                        );
                        return Ok(value);
                    }
                    debug!(what, attempts, "Not settled yet, polling again");
                    response.to_string()
                }
                Err(e @ ProbeError::Transport { .. }) => {
                    warn!(what, attempts, error = %e, "Status query failed, polling again");
                    e.to_string()
                }
                Err(e) => return Err(e),
            };

            if started.elapsed() + self.interval > self.timeout {
                return Err(ProbeError::Timeout {
                    what: what.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                    last_response,
                });
            }

            sleep(self.interval).await;
        }
    }

    /// Poll until the string at `status_path` (within the response body) is one of `terminal`
    ///
    /// Returns the terminal status. A missing status is treated as not yet settled.
    pub async fn until_status(
        &self,
        operation: &Operation,
        status_path: &str,
        terminal: &[&str],
    ) -> Result<String> {
        let what = format!("{} in {:?}", status_path, terminal);
        self.until(&what, operation, |response| {
            let status = response
                .data()
                .and_then(|data| value_at(data, status_path))
                .and_then(Value::as_str);
            Ok(match status {
                Some(s) if terminal.contains(&s) => PollDecision::Done(s.to_string()),
                _ => PollDecision::Pending,
            })
        })
        .await
    }
}
