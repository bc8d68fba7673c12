// Unit tests for response predicates, failing checks and outcome classification

use gqlprobe::assertions::*;
use gqlprobe::graphql::GraphqlResponse;
use gqlprobe::{FailureKind, ProbeError};
use serde_json::json;

const QUERY: &str = "mutation {createRefund(paymentId: \"pay_1\") {code}}";

fn ok(body: serde_json::Value) -> GraphqlResponse {
    GraphqlResponse::from_json(200, body)
}

#[test]
fn test_success_predicates() {
    let response = ok(json!({ "data": { "createRefund": { "code": "OK" } } }));
    assert!(is_transport_success(&response));
    assert!(has_no_graphql_errors(&response));
    assert!(has_data(&response));
    assert!(!has_graphql_errors(&response));
    assert!(!is_protocol_rejection(&response));
}

#[test]
fn test_empty_errors_array_counts_as_no_errors() {
    let response = ok(json!({ "data": { "a": 1 }, "errors": [] }));
    assert!(has_no_graphql_errors(&response));
    assert!(expect_success(QUERY, &response).is_ok());
}

#[test]
fn test_null_data_counts_as_absent() {
    let response = GraphqlResponse::from_json(400, json!({ "data": null, "errors": [{ "message": "bad" }] }));
    assert!(!has_data(&response));
    assert!(is_protocol_rejection(&response));
    assert!(expect_rejection(QUERY, &response).is_ok());
}

#[test]
fn test_undecodable_body() {
    let response = GraphqlResponse::from_raw(502, "<html>Bad Gateway</html>");
    assert!(!is_transport_success(&response));
    assert!(!has_data(&response));
    assert!(!has_graphql_errors(&response));
    assert_eq!(response.to_string(), "502 <html>Bad Gateway</html>");
}

#[test]
fn test_expect_success_names_the_failing_predicate() {
    let cases = [
        (GraphqlResponse::from_json(500, json!({ "data": { "a": 1 } })), "is_transport_success"),
        (ok(json!({ "data": { "a": 1 }, "errors": [{ "message": "partial" }] })), "has_no_graphql_errors"),
        (ok(json!({ "data": null })), "has_data"),
    ];
    for (response, invariant) in cases {
        let err = expect_success(QUERY, &response).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ContractViolation);
        assert_eq!(err.invariant(), Some(invariant));
        assert!(err.to_string().contains(QUERY), "message must carry the query: {}", err);
    }
}

#[test]
fn test_expect_rejection_names_the_failing_predicate() {
    let cases = [
        (ok(json!({ "data": { "a": 1 } })), "has_graphql_errors"),
        (ok(json!({ "data": { "a": 1 }, "errors": [{ "message": "x" }] })), "has_no_data"),
        (
            GraphqlResponse::from_json(500, json!({ "errors": [{ "message": "boom" }] })),
            "rejection_is_not_server_error",
        ),
    ];
    for (response, invariant) in cases {
        let err = expect_rejection(QUERY, &response).unwrap_err();
        assert_eq!(err.invariant(), Some(invariant));
    }
}

#[test]
fn test_rejection_with_2xx_status_is_accepted() {
    let response = ok(json!({ "errors": [{ "message": "first and last cannot be combined" }] }));
    assert!(expect_rejection(QUERY, &response).is_ok());
}

#[test]
fn test_ensure_builds_invariant_violation() {
    let response = ok(json!({ "data": {} }));
    assert!(ensure(true, "duality", QUERY, &response, || unreachable!()).is_ok());
    let err = ensure(false, "duality", QUERY, &response, || "edges[0] differs".to_string()).unwrap_err();
    match err {
        ProbeError::InvariantViolation { invariant, detail, query, response } => {
            assert_eq!(invariant, "duality");
            assert_eq!(detail, "edges[0] differs");
            assert_eq!(query, QUERY);
            assert!(response.starts_with("200 "));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_value_helpers() {
    let value = json!({ "refund": { "id": 42, "items": [{ "name": "Summer Sale" }] } });
    assert_eq!(value_at(&value, "refund.items.0.name"), Some(&json!("Summer Sale")));
    assert_eq!(value_at(&value, "refund.missing"), None);
    assert_eq!(item_id(&value["refund"]), Some("42".to_string()));
    assert!(is_non_null(value_at(&value, "refund")));
    assert!(!is_non_null(Some(&json!(null))));
    assert!(contains_case_insensitive("Summer Sale", "SUMMER"));
    assert!(!contains_case_insensitive("Winter", "summer"));
}

#[test]
fn test_classify_outcomes() {
    let rule = DomainCodeRule::default();

    let success = ok(json!({ "data": { "createRefund": { "code": "OK", "refund": { "id": "r1" } } } }));
    assert_eq!(classify(&success, "createRefund", &rule), Outcome::Success);

    let domain = ok(json!({ "data": { "createRefund": { "code": "ERROR", "message": "payment already refunded" } } }));
    assert_eq!(
        classify(&domain, "createRefund", &rule),
        Outcome::DomainRejection {
            code: "ERROR".to_string(),
            message: "payment already refunded".to_string(),
        }
    );

    let rejected = GraphqlResponse::from_json(409, json!({ "errors": [{ "message": "idempotency key already used" }] }));
    assert_eq!(
        classify(&rejected, "createRefund", &rule),
        Outcome::TransportRejection {
            status_code: 409,
            message: "idempotency key already used".to_string(),
        }
    );

    let null_payload = ok(json!({ "data": { "createRefund": null } }));
    assert_eq!(classify(&null_payload, "createRefund", &rule).label(), "transport_rejection");
}

#[test]
fn test_classify_with_custom_rule() {
    let rule = DomainCodeRule {
        code_field: "status".to_string(),
        error_code: "REJECTED".to_string(),
        message_field: "reason".to_string(),
    };
    let response = ok(json!({ "data": { "capture": { "status": "REJECTED", "reason": "expired" } } }));
    assert_eq!(
        classify(&response, "capture", &rule),
        Outcome::DomainRejection {
            code: "REJECTED".to_string(),
            message: "expired".to_string(),
        }
    );
    let response = ok(json!({ "data": { "capture": { "code": "ERROR" } } }));
    assert!(classify(&response, "capture", &rule).is_success());
}
