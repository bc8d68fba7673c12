use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::config::OracleConfig;
use crate::core::Result;
use crate::modules::assertions::{classify, DomainCodeRule, Outcome};
use crate::modules::graphql::{GraphqlTransport, Headers};
use crate::modules::scenarios::models::ProbeContext;

/// Result of a teardown pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub deleted: usize,
    /// Ids whose delete mutation failed
    pub failed: Vec<String>,
}

/// Runs scenario bodies with a fresh `ProbeContext` and unconditional teardown
pub struct ScenarioRunner {
    transport: Arc<dyn GraphqlTransport>,
    headers: Headers,
    namespace_prefix: String,
}

impl ScenarioRunner {
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self {
            transport,
            headers: Headers::new(),
            namespace_prefix: OracleConfig::default().namespace_prefix,
        }
    }

    pub fn with_config(mut self, config: &OracleConfig) -> Self {
        self.namespace_prefix = config.namespace_prefix.clone();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn context(&self, scenario: &str) -> ProbeContext {
        ProbeContext::new(scenario, &self.namespace_prefix)
    }

    /// Run `body` and then delete everything it registered
    ///
    /// Teardown runs whether the body succeeded, failed or panicked. Its own
    /// failures are logged and never replace the body's result; a panic is
    /// resumed after teardown.
    pub async fn run<F, Fut, T>(&self, scenario: &str, body: F) -> Result<T>
    where
        F: FnOnce(ProbeContext) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let ctx = self.context(scenario);
        info!(scenario, namespace = ctx.namespace(), "Scenario started");

        let handle = ctx.clone();
        let outcome = AssertUnwindSafe(async move { body(handle).await })
            .catch_unwind()
            .await;

        let report = self.teardown(&ctx).await;
        if !report.failed.is_empty() {
            warn!(scenario, failed = ?report.failed, "Teardown left resources behind");
        }

        match outcome {
            Ok(Ok(value)) => {
                info!(scenario, deleted = report.deleted, "Scenario passed");
                Ok(value)
            }
            Ok(Err(e)) => {
                error!(scenario, kind = %e.kind(), "Scenario failed");
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Best-effort delete of every registered resource, newest first
    pub async fn teardown(&self, ctx: &ProbeContext) -> TeardownReport {
        let mut report = TeardownReport::default();
        let rule = DomainCodeRule::default();

        for resource in ctx.take_created().into_iter().rev() {
            let result_key = resource
                .delete
                .root()
                .map(|f| f.response_key().to_string())
                .unwrap_or_default();

            match self.transport.execute(&resource.delete, &self.headers).await {
                Ok(response) => match classify(&response, &result_key, &rule) {
                    Outcome::Success => report.deleted += 1,
                    outcome => {
                        warn!(
                            id = %resource.id,
                            outcome = outcome.label(),
                            response = %response,
                            "Teardown delete rejected"
                        );
                        report.failed.push(resource.id);
                    }
                },
                Err(e) => {
                    warn!(id = %resource.id, error = %e, "Teardown delete failed");
                    report.failed.push(resource.id);
                }
            }
        }

        report
    }
}
