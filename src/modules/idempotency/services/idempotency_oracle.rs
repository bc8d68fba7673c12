use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::OracleConfig;
use crate::core::{ProbeError, Result};
use crate::modules::assertions::{
    classify, contract_violation, expect_rejection, expect_success, invariant_violation, value_at,
    DomainCodeRule, Outcome,
};
use crate::modules::graphql::{GraphqlResponse, GraphqlTransport, Headers, Operation};
use crate::modules::idempotency::models::{
    ExpectedFirstOutcome, ExpectedRepeatOutcome, IdempotencyKey, IdempotencyProbe, ProbeEvent,
    ProbeState,
};

/// Business error observed where one was expected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRejectionReport {
    pub code: String,
    pub message: String,
}

/// Verifies at-most-once side effects per idempotency key
pub struct IdempotencyOracle {
    transport: Arc<dyn GraphqlTransport>,
    key_header: String,
    headers: Headers,
}

impl IdempotencyOracle {
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self {
            transport,
            key_header: OracleConfig::default().idempotency_header,
            headers: Headers::new(),
        }
    }

    pub fn with_config(mut self, config: &OracleConfig) -> Self {
        self.key_header = config.idempotency_header.clone();
        self
    }

    pub fn with_key_header(mut self, header: impl Into<String>) -> Self {
        self.key_header = header.into();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    async fn send(
        &self,
        mutation: &Operation,
        key: Option<&IdempotencyKey>,
    ) -> Result<(String, GraphqlResponse)> {
        let query = mutation.render();
        let mut headers = self.headers.clone();
        headers.remove(&self.key_header);
        if let Some(key) = key {
            headers.insert(self.key_header.clone(), key.as_str().to_string());
        }
        debug!(query = %query, key = ?key.map(IdempotencyKey::as_str), "Idempotency probe request");
        let response = self.transport.post(&query, &headers).await?;
        Ok((query, response))
    }

    fn capture_resource_id(
        probe: &IdempotencyProbe,
        data: &Value,
        query: &str,
        response: &GraphqlResponse,
    ) -> Result<Option<String>> {
        let Some(path) = &probe.resource_id_path else {
            return Ok(None);
        };
        let value = data
            .get(probe.result_key())
            .and_then(|payload| value_at(payload, path));
        match value {
            Some(Value::String(id)) => Ok(Some(id.clone())),
            Some(Value::Number(id)) => Ok(Some(id.to_string())),
            _ => Err(contract_violation(
                "resource_id_captured",
                format!("no resource id at {}.{}", probe.result_key(), path),
                query,
                response,
            )),
        }
    }

    /// Issue the mutation with the probe's key and check the expected first outcome
    ///
    /// Returns the captured resource id when the call was expected to succeed.
    pub async fn verify_first_call_succeeds(
        &self,
        probe: &mut IdempotencyProbe,
    ) -> Result<Option<String>> {
        probe.require_state(ProbeState::Unsent, "first call")?;
        let (query, response) = self.send(&probe.mutation, Some(&probe.key)).await?;
        let outcome = classify(&response, probe.result_key(), &probe.domain_rule);

        match (probe.expected_first, outcome) {
            (ExpectedFirstOutcome::Success, Outcome::Success) => {
                let data = expect_success(&query, &response)?;
                let resource_id = Self::capture_resource_id(probe, data, &query, &response)?;
                probe.apply(ProbeEvent::FirstSucceeded {
                    resource_id: resource_id.clone(),
                })?;
                info!(key = %probe.key, resource_id = ?resource_id, "First call succeeded");
                Ok(resource_id)
            }
            (ExpectedFirstOutcome::Success, Outcome::TransportRejection { message, .. }) => {
                Err(contract_violation(
                    "first_call_succeeds",
                    format!("first call with a fresh key was rejected: {}", message),
                    &query,
                    &response,
                ))
            }
            (ExpectedFirstOutcome::Success, Outcome::DomainRejection { code, message }) => {
                Err(ProbeError::DomainRejection {
                    code,
                    detail: message,
                    query,
                    response: response.to_string(),
                })
            }
            (ExpectedFirstOutcome::Error, Outcome::Success) => Err(contract_violation(
                "first_call_fails",
                "call expected to fail before any side effect succeeded",
                &query,
                &response,
            )),
            (ExpectedFirstOutcome::Error, outcome) => {
                probe.apply(ProbeEvent::FirstFailed)?;
                info!(key = %probe.key, outcome = outcome.label(), "First call failed as expected");
                Ok(None)
            }
        }
    }

    /// Replay the identical mutation with the same key
    ///
    /// `Rejected` probes require a protocol-level rejection with no data;
    /// `NoOp` probes require the original result back.
    pub async fn verify_repeat_with_same_key_is_rejected(
        &self,
        probe: &mut IdempotencyProbe,
    ) -> Result<()> {
        probe.require_state(ProbeState::SentOk, "replay")?;
        let (query, response) = self.send(&probe.mutation, Some(&probe.key)).await?;
        let outcome = classify(&response, probe.result_key(), &probe.domain_rule);

        match probe.expected_repeat {
            ExpectedRepeatOutcome::Rejected => {
                if outcome.is_success() {
                    return Err(contract_violation(
                        "replay_rejected",
                        format!("replay with key {} succeeded a second time", probe.key),
                        &query,
                        &response,
                    ));
                }
                expect_rejection(&query, &response)?;
                probe.apply(ProbeEvent::ReplayRejected)?;
            }
            ExpectedRepeatOutcome::NoOp => {
                if !outcome.is_success() {
                    return Err(contract_violation(
                        "replay_no_op",
                        format!(
                            "replay with key {} was not answered with the original result ({})",
                            probe.key,
                            outcome.label()
                        ),
                        &query,
                        &response,
                    ));
                }
                let data = expect_success(&query, &response)?;
                let replayed_id = Self::capture_resource_id(probe, data, &query, &response)?;
                if replayed_id.as_deref() != probe.resource_id() {
                    return Err(invariant_violation(
                        "replay_no_op",
                        format!(
                            "replay returned resource {:?}, first call created {:?}",
                            replayed_id,
                            probe.resource_id()
                        ),
                        &query,
                        &response,
                    ));
                }
                probe.apply(ProbeEvent::ReplayNoOp)?;
            }
        }

        info!(key = %probe.key, state = %probe.state(), "Replay handled as expected");
        Ok(())
    }

    /// A different key against the settled resource is accepted by the transport
    /// but rejected by a business rule
    pub async fn verify_new_key_against_settled_resource_is_domain_rejected(
        &self,
        probe: &IdempotencyProbe,
        new_key: &IdempotencyKey,
    ) -> Result<DomainRejectionReport> {
        if !probe.is_settled() {
            return Err(ProbeError::InvalidTransition {
                from: probe.state().to_string(),
                event: "new key against settled resource".to_string(),
            });
        }
        if new_key == &probe.key {
            return Err(ProbeError::validation(format!(
                "new key must differ from the probe key {}",
                probe.key
            )));
        }

        let (query, response) = self.send(&probe.mutation, Some(new_key)).await?;
        match classify(&response, probe.result_key(), &probe.domain_rule) {
            Outcome::DomainRejection { code, message } => {
                info!(
                    key = %new_key,
                    code = %code,
                    message = %message,
                    "Settled resource rejected by business rule"
                );
                Ok(DomainRejectionReport { code, message })
            }
            Outcome::Success => Err(invariant_violation(
                "new_key_domain_rejected",
                format!("key {} produced a second side effect on a settled resource", new_key),
                &query,
                &response,
            )),
            Outcome::TransportRejection { status_code, message } => Err(contract_violation(
                "new_key_transport_success",
                format!(
                    "expected transport success carrying a domain error, got rejection {}: {}",
                    status_code, message
                ),
                &query,
                &response,
            )),
        }
    }

    /// Mutation without the idempotency header is always rejected
    pub async fn verify_missing_key_header_fails(&self, mutation: &Operation) -> Result<()> {
        let (query, response) = self.send(mutation, None).await?;
        let result_key = mutation.root().map(|f| f.response_key()).unwrap_or_default();
        if classify(&response, result_key, &DomainCodeRule::default()).is_success() {
            return Err(contract_violation(
                "missing_key_rejected",
                format!("mutation without {} header succeeded", self.key_header),
                &query,
                &response,
            ));
        }
        expect_rejection(&query, &response)?;
        info!(header = %self.key_header, "Missing idempotency header rejected");
        Ok(())
    }

    /// First call, same-key replay, then a fresh key against the settled resource
    pub async fn verify_full_cycle(
        &self,
        probe: &mut IdempotencyProbe,
        new_key: &IdempotencyKey,
    ) -> Result<DomainRejectionReport> {
        self.verify_first_call_succeeds(probe).await?;
        if probe.state() == ProbeState::SentError {
            return Err(ProbeError::validation(
                "full cycle requires a probe whose first call is expected to succeed",
            ));
        }
        self.verify_repeat_with_same_key_is_rejected(probe).await?;
        self.verify_new_key_against_settled_resource_is_domain_rejected(probe, new_key)
            .await
    }
}
