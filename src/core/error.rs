/// Probe-wide Result type
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Coarse failure category, one per entry of the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    ContractViolation,
    DomainRejection,
    InvariantViolation,
    Timeout,
    Usage,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::ContractViolation => write!(f, "contract_violation"),
            FailureKind::DomainRejection => write!(f, "domain_rejection"),
            FailureKind::InvariantViolation => write!(f, "invariant_violation"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Usage => write!(f, "usage"),
        }
    }
}

/// Main probe error type
///
/// Every variant raised against a live response carries the query that
/// triggered it and the rendered response, so a failure can be reproduced
/// from the message alone.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    /// Network failure or unreadable transport response
    #[error("Transport error: {message}\n  query: {query}")]
    Transport { query: String, message: String },

    /// GraphQL success/error shape did not match what the probe expected
    #[error("Contract violation [{invariant}]: {detail}\n  query: {query}\n  response: {response}")]
    ContractViolation {
        invariant: &'static str,
        detail: String,
        query: String,
        response: String,
    },

    /// Structurally successful response whose payload carries a business error
    #[error("Domain rejection (code {code}): {detail}\n  query: {query}\n  response: {response}")]
    DomainRejection {
        code: String,
        detail: String,
        query: String,
        response: String,
    },

    /// Structurally successful response whose values break an expected property
    #[error("Invariant violation [{invariant}]: {detail}\n  query: {query}\n  response: {response}")]
    InvariantViolation {
        invariant: &'static str,
        detail: String,
        query: String,
        response: String,
    },

    /// Poll deadline passed before a terminal state was observed
    #[error("Timeout after {waited_ms}ms waiting for {what}; last response: {last_response}")]
    Timeout {
        what: String,
        waited_ms: u64,
        last_response: String,
    },

    /// Idempotency probe driven through a transition its state machine forbids
    #[error("Invalid probe transition: {event} from state {from}")]
    InvalidTransition { from: String, event: String },

    /// Malformed spec, probe or argument supplied by the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Suite file parse errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ProbeError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        ProbeError::Configuration(msg.into())
    }

    pub fn transport(query: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::Transport {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Transport { .. } => FailureKind::Transport,
            ProbeError::ContractViolation { .. } => FailureKind::ContractViolation,
            ProbeError::DomainRejection { .. } => FailureKind::DomainRejection,
            ProbeError::InvariantViolation { .. } => FailureKind::InvariantViolation,
            ProbeError::Timeout { .. } => FailureKind::Timeout,
            ProbeError::InvalidTransition { .. }
            | ProbeError::Validation(_)
            | ProbeError::Configuration(_)
            | ProbeError::Json(_)
            | ProbeError::Yaml(_)
            | ProbeError::Io(_) => FailureKind::Usage,
        }
    }

    /// Name of the violated invariant, when the error is a violation
    pub fn invariant(&self) -> Option<&'static str> {
        match self {
            ProbeError::ContractViolation { invariant, .. }
            | ProbeError::InvariantViolation { invariant, .. } => Some(*invariant),
            _ => None,
        }
    }
}
