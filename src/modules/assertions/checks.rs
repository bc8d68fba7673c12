// Failing forms of the predicates
//
// Each check returns a `ProbeError` naming the violated predicate together
// with the query and response that produced it.

use serde_json::Value;
use tracing::error;

use super::predicates::{has_data, has_graphql_errors, has_no_graphql_errors, is_transport_success};
use crate::core::{ProbeError, Result};
use crate::modules::graphql::GraphqlResponse;

/// Build a protocol contract violation and log it
pub fn contract_violation(
    invariant: &'static str,
    detail: impl Into<String>,
    query: &str,
    response: &GraphqlResponse,
) -> ProbeError {
    let detail = detail.into();
    error!(invariant, detail = %detail, status = response.status_code, "Contract violation");
    ProbeError::ContractViolation {
        invariant,
        detail,
        query: query.to_string(),
        response: response.to_string(),
    }
}

/// Build a value-level invariant violation and log it
pub fn invariant_violation(
    invariant: &'static str,
    detail: impl Into<String>,
    query: &str,
    response: &GraphqlResponse,
) -> ProbeError {
    let detail = detail.into();
    error!(invariant, detail = %detail, "Invariant violation");
    ProbeError::InvariantViolation {
        invariant,
        detail,
        query: query.to_string(),
        response: response.to_string(),
    }
}

/// Fail with an invariant violation unless `holds`
pub fn ensure(
    holds: bool,
    invariant: &'static str,
    query: &str,
    response: &GraphqlResponse,
    detail: impl FnOnce() -> String,
) -> Result<()> {
    if holds {
        Ok(())
    } else {
        Err(invariant_violation(invariant, detail(), query, response))
    }
}

/// Require a fully successful response and return its `data`
pub fn expect_success<'r>(query: &str, response: &'r GraphqlResponse) -> Result<&'r Value> {
    if !is_transport_success(response) {
        return Err(contract_violation(
            "is_transport_success",
            format!("expected 2xx status, got {}", response.status_code),
            query,
            response,
        ));
    }
    if !has_no_graphql_errors(response) {
        return Err(contract_violation(
            "has_no_graphql_errors",
            format!(
                "expected no GraphQL errors, got: {}",
                response.first_error_message().unwrap_or("<no message>")
            ),
            query,
            response,
        ));
    }
    response.data().ok_or_else(|| {
        contract_violation("has_data", "expected a non-null data member", query, response)
    })
}

/// Require a request-level rejection: errors present, data absent, no server fault
pub fn expect_rejection(query: &str, response: &GraphqlResponse) -> Result<()> {
    if !has_graphql_errors(response) {
        return Err(contract_violation(
            "has_graphql_errors",
            "expected the request to be rejected with GraphQL errors",
            query,
            response,
        ));
    }
    if has_data(response) {
        return Err(contract_violation(
            "has_no_data",
            "rejected request must not carry data",
            query,
            response,
        ));
    }
    if response.status_code >= 500 {
        return Err(contract_violation(
            "rejection_is_not_server_error",
            format!("rejection reported as server fault {}", response.status_code),
            query,
            response,
        ));
    }
    Ok(())
}

/// Require `value` to be present and satisfy `predicate`
pub fn expect_shape<'v>(
    value: Option<&'v Value>,
    predicate: fn(&Value) -> bool,
    invariant: &'static str,
    what: &str,
    query: &str,
    response: &GraphqlResponse,
) -> Result<&'v Value> {
    match value {
        Some(v) if predicate(v) => Ok(v),
        Some(v) => Err(contract_violation(
            invariant,
            format!("{} has unexpected shape: {}", what, v),
            query,
            response,
        )),
        None => Err(contract_violation(
            invariant,
            format!("{} missing from response", what),
            query,
            response,
        )),
    }
}
