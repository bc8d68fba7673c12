// Idempotency probe and its lifecycle
//
// A probe is created per test invocation and discarded after its assertions.
// Lifecycle:
//   Unsent -> SentOk -> ReplayedRejected
//   Unsent -> SentOk -> ReplayedNoOp
//   Unsent -> SentError

use serde::{Deserialize, Serialize};

use super::key::IdempotencyKey;
use crate::core::{ProbeError, Result};
use crate::modules::assertions::DomainCodeRule;
use crate::modules::graphql::{Operation, OperationKind};

/// Expected result of the first call with a fresh key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectedFirstOutcome {
    Success,
    Error,
}

/// Expected result of replaying the identical call with the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectedRepeatOutcome {
    /// Replay is refused at the protocol layer
    Rejected,
    /// Replay succeeds but returns the original result without a new side effect
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeState {
    Unsent,
    SentOk,
    SentError,
    ReplayedRejected,
    ReplayedNoOp,
}

impl std::fmt::Display for ProbeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeState::Unsent => write!(f, "UNSENT"),
            ProbeState::SentOk => write!(f, "SENT_OK"),
            ProbeState::SentError => write!(f, "SENT_ERROR"),
            ProbeState::ReplayedRejected => write!(f, "REPLAYED_REJECTED"),
            ProbeState::ReplayedNoOp => write!(f, "REPLAYED_NO_OP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    FirstSucceeded { resource_id: Option<String> },
    FirstFailed,
    ReplayRejected,
    ReplayNoOp,
}

impl ProbeEvent {
    fn name(&self) -> &'static str {
        match self {
            ProbeEvent::FirstSucceeded { .. } => "first call succeeded",
            ProbeEvent::FirstFailed => "first call failed",
            ProbeEvent::ReplayRejected => "replay rejected",
            ProbeEvent::ReplayNoOp => "replay no-op",
        }
    }
}

/// One idempotency-key probe against a mutation
#[derive(Debug, Clone)]
pub struct IdempotencyProbe {
    pub mutation: Operation,
    pub key: IdempotencyKey,
    pub expected_first: ExpectedFirstOutcome,
    pub expected_repeat: ExpectedRepeatOutcome,
    /// Path within the mutation payload of the created/affected resource id
    pub resource_id_path: Option<String>,
    pub domain_rule: DomainCodeRule,
    state: ProbeState,
    resource_id: Option<String>,
}

impl IdempotencyProbe {
    pub fn new(mutation: Operation, key: IdempotencyKey) -> Result<Self> {
        if mutation.kind != OperationKind::Mutation {
            return Err(ProbeError::validation("idempotency probes require a mutation"));
        }
        if mutation.fields.len() != 1 {
            return Err(ProbeError::validation(
                "idempotency probes require exactly one root mutation field",
            ));
        }
        Ok(Self {
            mutation,
            key,
            expected_first: ExpectedFirstOutcome::Success,
            expected_repeat: ExpectedRepeatOutcome::Rejected,
            resource_id_path: None,
            domain_rule: DomainCodeRule::default(),
            state: ProbeState::Unsent,
            resource_id: None,
        })
    }

    pub fn expect_first(mut self, outcome: ExpectedFirstOutcome) -> Self {
        self.expected_first = outcome;
        self
    }

    pub fn expect_repeat(mut self, outcome: ExpectedRepeatOutcome) -> Self {
        self.expected_repeat = outcome;
        self
    }

    pub fn resource_id_path(mut self, path: impl Into<String>) -> Self {
        self.resource_id_path = Some(path.into());
        self
    }

    pub fn domain_rule(mut self, rule: DomainCodeRule) -> Self {
        self.domain_rule = rule;
        self
    }

    /// Response key of the root mutation field
    pub fn result_key(&self) -> &str {
        self.mutation.root().map(|f| f.response_key()).unwrap_or_default()
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Id captured from the successful first call
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// First call succeeded and the resource it touched is settled
    pub fn is_settled(&self) -> bool {
        matches!(
            self.state,
            ProbeState::SentOk | ProbeState::ReplayedRejected | ProbeState::ReplayedNoOp
        )
    }

    /// Fail unless the probe is in `expected`, without changing state
    pub fn require_state(&self, expected: ProbeState, event: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProbeError::InvalidTransition {
                from: self.state.to_string(),
                event: event.to_string(),
            })
        }
    }

    /// Advance the state machine
    pub fn apply(&mut self, event: ProbeEvent) -> Result<ProbeState> {
        let next = match (self.state, &event) {
            (ProbeState::Unsent, ProbeEvent::FirstSucceeded { resource_id }) => {
                self.resource_id = resource_id.clone();
                ProbeState::SentOk
            }
            (ProbeState::Unsent, ProbeEvent::FirstFailed) => ProbeState::SentError,
            (ProbeState::SentOk, ProbeEvent::ReplayRejected) => ProbeState::ReplayedRejected,
            (ProbeState::SentOk, ProbeEvent::ReplayNoOp) => ProbeState::ReplayedNoOp,
            (from, event) => {
                return Err(ProbeError::InvalidTransition {
                    from: from.to_string(),
                    event: event.name().to_string(),
                })
            }
        };
        self.state = next;
        Ok(next)
    }
}
