use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::predicates::{has_graphql_errors, is_transport_success, value_at};
use crate::modules::graphql::GraphqlResponse;

/// How a mutation payload signals a business failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainCodeRule {
    /// Field of the mutation payload holding the result code
    pub code_field: String,
    /// Code value that means the operation was rejected by a business rule
    pub error_code: String,
    /// Field of the mutation payload holding a human-readable message
    pub message_field: String,
}

impl Default for DomainCodeRule {
    fn default() -> Self {
        Self {
            code_field: "code".to_string(),
            error_code: "ERROR".to_string(),
            message_field: "message".to_string(),
        }
    }
}

/// Classified result of a mutating request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transport success, no errors, payload present and not flagged as an error
    Success,
    /// Rejected at the HTTP or GraphQL protocol layer
    TransportRejection { status_code: u16, message: String },
    /// Transport success with a payload whose result code signals a business error
    DomainRejection { code: String, message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::TransportRejection { .. } => "transport_rejection",
            Outcome::DomainRejection { .. } => "domain_rejection",
        }
    }
}

/// Classify the response of a mutation whose payload sits under `data.<result_key>`
pub fn classify(response: &GraphqlResponse, result_key: &str, rule: &DomainCodeRule) -> Outcome {
    let payload = response
        .data()
        .and_then(|data| data.get(result_key))
        .filter(|p| !p.is_null());

    let payload = match payload {
        Some(payload) if is_transport_success(response) => payload,
        _ => {
            let message = response
                .first_error_message()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if has_graphql_errors(response) {
                        "GraphQL errors without message".to_string()
                    } else {
                        format!("no '{}' payload in response", result_key)
                    }
                });
            return Outcome::TransportRejection {
                status_code: response.status_code,
                message,
            };
        }
    };

    match value_at(payload, &rule.code_field).and_then(Value::as_str) {
        Some(code) if code == rule.error_code => Outcome::DomainRejection {
            code: code.to_string(),
            message: value_at(payload, &rule.message_field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        _ => Outcome::Success,
    }
}
