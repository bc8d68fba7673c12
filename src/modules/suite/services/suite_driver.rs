use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::OracleConfig;
use crate::core::{FailureKind, Result};
use crate::modules::connections::ConnectionOracle;
use crate::modules::graphql::{GraphqlTransport, Headers};
use crate::modules::idempotency::{ExpectedFirstOutcome, IdempotencyOracle, IdempotencyProbe};
use crate::modules::scenarios::{ProbeContext, ScenarioRunner};
use crate::modules::suite::models::{
    ConnectionCase, CustomDataCase, IdempotencyCase, MissingKeyCase, SuiteFile,
};

/// Outcome of one suite case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl CaseReport {
    fn from_result(name: String, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                name,
                passed: true,
                kind: None,
                failure: None,
            },
            Err(e) => Self {
                name,
                passed: false,
                kind: Some(e.kind()),
                failure: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed)
    }
}

/// Runs every case of a suite file, one scenario at a time
///
/// A failing case is recorded and the run moves on to the next case.
pub struct SuiteDriver {
    transport: Arc<dyn GraphqlTransport>,
    config: OracleConfig,
    headers: Headers,
}

impl SuiteDriver {
    pub fn new(transport: Arc<dyn GraphqlTransport>, config: OracleConfig) -> Self {
        Self {
            transport,
            config,
            headers: Headers::new(),
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    fn runner(&self) -> ScenarioRunner {
        ScenarioRunner::new(self.transport.clone())
            .with_config(&self.config)
            .with_headers(self.headers.clone())
    }

    fn idempotency_oracle(&self) -> IdempotencyOracle {
        IdempotencyOracle::new(self.transport.clone())
            .with_config(&self.config)
            .with_headers(self.headers.clone())
    }

    pub async fn run(&self, suite: &SuiteFile) -> SuiteReport {
        let mut report = SuiteReport::default();

        for case in &suite.connections {
            let name = format!("connection:{}", case.field);
            let result = self.run_connection(&name, case).await;
            report.cases.push(self.record(name, result));
        }

        for (i, case) in suite.missing_key_checks.iter().enumerate() {
            let name = case
                .name
                .clone()
                .unwrap_or_else(|| format!("missing_key:{}#{}", case.mutation.field, i));
            let result = self.run_missing_key(&name, case).await;
            report.cases.push(self.record(name, result));
        }

        for case in &suite.idempotency_probes {
            let name = format!("idempotency:{}", case.name);
            let result = self.run_idempotency(&name, case).await;
            report.cases.push(self.record(name, result));
        }

        info!(
            passed = report.passed(),
            failed = report.failed(),
            "Suite finished"
        );
        report
    }

    fn record(&self, name: String, result: Result<()>) -> CaseReport {
        let case = CaseReport::from_result(name, result);
        if let (Some(kind), Some(failure)) = (&case.kind, &case.failure) {
            error!(case = %case.name, kind = %kind, "{}", failure);
        }
        case
    }

    async fn run_connection(&self, name: &str, case: &ConnectionCase) -> Result<()> {
        let spec = case.to_spec(self.config.default_page_size)?;
        let oracle = ConnectionOracle::new(self.transport.clone(), spec)
            .with_config(&self.config)
            .with_headers(self.headers.clone());
        let search_term = case.search_term.as_deref();
        let custom_data = &case.custom_data;

        self.runner()
            .run(name, |_ctx| async move {
                Self::check_connection(&oracle, search_term, custom_data).await
            })
            .await
    }

    async fn check_connection(
        oracle: &ConnectionOracle,
        search_term: Option<&str>,
        custom_data: &[CustomDataCase],
    ) -> Result<()> {
        oracle.run_all(search_term).await?;
        for check in custom_data {
            oracle
                .verify_custom_data_passthrough(&check.id, &check.expected)
                .await?;
        }
        Ok(())
    }

    async fn run_missing_key(&self, name: &str, case: &MissingKeyCase) -> Result<()> {
        let oracle = self.idempotency_oracle();
        let mutation = case.mutation.to_operation();

        self.runner()
            .run(name, |_ctx| async move {
                oracle.verify_missing_key_header_fails(&mutation).await
            })
            .await
    }

    async fn run_idempotency(&self, name: &str, case: &IdempotencyCase) -> Result<()> {
        let oracle = self.idempotency_oracle();

        self.runner()
            .run(name, |ctx| async move {
                Self::check_idempotency(&oracle, &ctx, case).await
            })
            .await
    }

    async fn check_idempotency(
        oracle: &IdempotencyOracle,
        ctx: &ProbeContext,
        case: &IdempotencyCase,
    ) -> Result<()> {
        case.validate()?;
        let key = ctx.mint_key(&case.key_strategy)?;
        let mut probe = IdempotencyProbe::new(case.mutation.to_operation(), key)?
            .expect_first(case.expected_first)
            .expect_repeat(case.expected_repeat);
        if let Some(path) = &case.resource_id_path {
            probe = probe.resource_id_path(path);
        }
        if let Some(rule) = &case.domain_rule {
            probe = probe.domain_rule(rule.clone());
        }

        let created = oracle.verify_first_call_succeeds(&mut probe).await?;
        // Register before the replay; teardown runs even if it fails
        if let (Some(teardown), Some(id)) = (&case.teardown, &created) {
            ctx.register(id.clone(), teardown.to_operation(id));
        }
        if case.expected_first == ExpectedFirstOutcome::Error {
            return Ok(());
        }
        oracle.verify_repeat_with_same_key_is_rejected(&mut probe).await?;
        if case.check_new_key {
            let new_key = ctx.mint_key(&case.key_strategy)?;
            oracle
                .verify_new_key_against_settled_resource_is_domain_rejected(&probe, &new_key)
                .await?;
        }
        Ok(())
    }
}
