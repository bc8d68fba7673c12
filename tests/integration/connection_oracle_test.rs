// Integration tests for the connection oracle
//
// Each test drives the oracle against the in-memory Relay service, once
// conformant and once with a single contract violation switched on.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use gqlprobe::connections::{ConnectionOracle, CursorSlice, OrderBy, PageRequest};
use gqlprobe::{FailureKind, ProbeError};
use helpers::*;
use serde_json::json;

fn oracle_for(api: FakeConnectionApi) -> (Arc<FakeConnectionApi>, ConnectionOracle) {
    let api = Arc::new(api);
    let oracle = ConnectionOracle::new(api.clone(), TestDataFactory::discount_spec_with_page_size(5));
    (api, oracle)
}

fn conformant(count: usize) -> FakeConnectionApi {
    FakeConnectionApi::new("discounts", TestDataFactory::discounts(count)).with_default_page_size(5)
}

fn quirky(count: usize, quirks: ConnectionQuirks) -> FakeConnectionApi {
    conformant(count).with_quirks(quirks)
}

fn assert_violation(err: ProbeError, kind: FailureKind, invariant: &str) {
    assert_eq!(err.kind(), kind, "{}", err);
    assert_eq!(err.invariant(), Some(invariant), "{}", err);
}

#[tokio::test]
async fn test_run_all_passes_on_conformant_connection() {
    let (api, oracle) = oracle_for(conformant(13));
    oracle.run_all(Some("summer")).await.unwrap();
    assert!(api.request_count() > 20);
}

#[tokio::test]
async fn test_order_by_is_mandatory() {
    let (api, oracle) = oracle_for(conformant(3));
    oracle.require_order_by_mandatory().await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 3);
    assert!(!requests[0].contains("orderBy"));
    assert!(requests[1].contains("orderBy: {direction: ASC}"));
    assert!(requests[2].contains("orderBy: {field: TIMESTAMP}"));
}

#[tokio::test]
async fn test_optional_order_by_is_a_contract_violation() {
    let (_, oracle) = oracle_for(quirky(3, ConnectionQuirks {
        optional_order_by: true,
        ..Default::default()
    }));
    let err = oracle.require_order_by_mandatory().await.unwrap_err();
    assert_violation(err, FailureKind::ContractViolation, "has_graphql_errors");
}

#[tokio::test]
async fn test_broken_duality_is_detected() {
    let (_, oracle) = oracle_for(quirky(4, ConnectionQuirks {
        broken_duality: true,
        ..Default::default()
    }));
    let err = oracle.verify_shape().await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "duality");
}

#[tokio::test]
async fn test_shape_of_empty_connection() {
    let (_, oracle) = oracle_for(conformant(0));
    let page = oracle.verify_shape().await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_count, 0);
    assert!(!page.page_info.has_next_page);
    oracle.verify_default_page_size().await.unwrap();
    oracle.verify_first(3).await.unwrap();
    oracle.verify_last(3).await.unwrap();
}

#[tokio::test]
async fn test_default_page_size_mismatch() {
    let api = Arc::new(FakeConnectionApi::new("discounts", TestDataFactory::discounts(12)).with_default_page_size(10));
    let oracle = ConnectionOracle::new(api, TestDataFactory::discount_spec_with_page_size(5));
    let err = oracle.verify_default_page_size().await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "default_page_size");
}

#[tokio::test]
async fn test_first_and_last_bounds() {
    let (_, oracle) = oracle_for(conformant(7));
    for n in [0, 1, 3, 7, 20] {
        oracle.verify_first(n).await.unwrap();
        oracle.verify_last(n).await.unwrap();
    }
}

#[tokio::test]
async fn test_wrong_total_count_breaks_first() {
    let (_, oracle) = oracle_for(quirky(3, ConnectionQuirks {
        total_count_offset: 2,
        ..Default::default()
    }));
    let err = oracle.verify_first(5).await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "first_count");
}

#[tokio::test]
async fn test_invalid_paging_rejected() {
    let (api, oracle) = oracle_for(conformant(6));
    oracle.verify_invalid_paging().await.unwrap();
    let requests = api.requests();
    assert!(requests.iter().any(|q| q.contains("first: -1")));
    assert!(requests.iter().any(|q| q.contains("last: \"ten\"")));
}

#[tokio::test]
async fn test_first_with_last_accepted_is_violation() {
    let (_, oracle) = oracle_for(quirky(6, ConnectionQuirks {
        accept_first_and_last: true,
        ..Default::default()
    }));
    let err = oracle.verify_invalid_paging().await.unwrap_err();
    assert_violation(err, FailureKind::ContractViolation, "has_graphql_errors");
}

#[tokio::test]
async fn test_server_error_is_not_a_valid_rejection() {
    let (_, oracle) = oracle_for(quirky(6, ConnectionQuirks {
        server_error_on_invalid: true,
        ..Default::default()
    }));
    let err = oracle.verify_invalid_paging().await.unwrap_err();
    assert_violation(err, FailureKind::ContractViolation, "rejection_is_not_server_error");
}

#[tokio::test]
async fn test_fetch_all_visits_every_item_once() {
    let (api, oracle) = oracle_for(conformant(12));
    let scan = oracle.fetch_all(&PageRequest::ordered(&OrderBy::asc("NAME"))).await.unwrap();
    assert_eq!(scan.edges.len(), 12);
    // 12 items in pages of 5
    assert_eq!(api.request_count(), 3);

    let names: Vec<String> = scan
        .edges
        .iter()
        .map(|e| e.node["name"].as_str().unwrap_or_default().to_string())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn test_fetch_all_detects_count_mismatch() {
    let (_, oracle) = oracle_for(quirky(7, ConnectionQuirks {
        total_count_offset: 1,
        ..Default::default()
    }));
    let err = oracle.fetch_all(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP"))).await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "scan_matches_total_count");
}

#[tokio::test]
async fn test_fetch_all_respects_scan_limit() {
    let (_, oracle) = oracle_for(conformant(12));
    let oracle = oracle.with_full_scan_limit(10);
    let err = oracle.fetch_all(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP"))).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Usage);
}

#[tokio::test]
async fn test_run_all_passes_beyond_scan_limit() {
    let (_, oracle) = oracle_for(conformant(30));
    let oracle = oracle.with_full_scan_limit(20);
    oracle.run_all(None).await.unwrap();
    // The full scan itself still refuses
    let err = oracle
        .fetch_all(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Usage);
}

#[tokio::test]
async fn test_fetch_window_stops_at_scan_limit() {
    let (api, oracle) = oracle_for(conformant(30));
    let oracle = oracle.with_full_scan_limit(12);
    let window = oracle
        .fetch_window(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP")))
        .await
        .unwrap();
    assert_eq!(window.edges.len(), 12);
    assert_eq!(window.total_count, 30);
    assert!(!window.complete);
    // 12 items in pages of 5
    assert_eq!(api.request_count(), 3);

    let (_, oracle) = oracle_for(conformant(4));
    let window = oracle
        .fetch_window(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP")))
        .await
        .unwrap();
    assert_eq!(window.edges.len(), 4);
    assert!(window.complete);
}

#[tokio::test]
async fn test_cursor_slicing_past_window_end() {
    // Pivot at position 3 of a 6-item window; `after` without a size returns 5 items
    let (_, oracle) = oracle_for(conformant(30));
    let oracle = oracle.with_full_scan_limit(6);
    oracle.verify_cursor_slicing(CursorSlice::After, None).await.unwrap();
    oracle.verify_cursor_slicing(CursorSlice::Before, None).await.unwrap();
}

#[tokio::test]
async fn test_search_beyond_scan_limit() {
    let api = Arc::new(FakeConnectionApi::new("discounts", TestDataFactory::discounts(30)));
    let oracle = ConnectionOracle::new(api, TestDataFactory::discount_spec()).with_full_scan_limit(5);
    oracle.verify_search("summer").await.unwrap();
}

#[tokio::test]
async fn test_custom_data_passthrough_beyond_scan_limit() {
    let (_, oracle) = oracle_for(conformant(30));
    let oracle = oracle.with_full_scan_limit(5);
    oracle
        .verify_custom_data_passthrough("d-025", &json!({ "batch": 5, "tag": "t25" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_order_reversal_on_every_field() {
    let (_, oracle) = oracle_for(conformant(11));
    oracle.verify_order_reversal("TIMESTAMP").await.unwrap();
    oracle.verify_order_reversal("NAME").await.unwrap();
}

#[tokio::test]
async fn test_order_reversal_uses_window_beyond_scan_limit() {
    let (api, oracle) = oracle_for(conformant(12));
    let oracle = oracle.with_full_scan_limit(8);
    oracle.verify_order_reversal("TIMESTAMP").await.unwrap();

    let requests = api.requests();
    // totalCount, then one first-window page and one last-window page
    assert_eq!(requests.len(), 3);
    assert!(requests[1].contains("first: 8"));
    assert!(requests[2].contains("last: 8"));
}

#[tokio::test]
async fn test_ignored_direction_breaks_reversal() {
    let (_, oracle) = oracle_for(quirky(6, ConnectionQuirks {
        ignore_direction: true,
        ..Default::default()
    }));
    let err = oracle.verify_order_reversal("TIMESTAMP").await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "order_reversal");
}

#[tokio::test]
async fn test_cursor_slicing_both_sides() {
    let (_, oracle) = oracle_for(conformant(9));
    oracle.verify_cursor_slicing(CursorSlice::After, Some(2)).await.unwrap();
    oracle.verify_cursor_slicing(CursorSlice::Before, Some(2)).await.unwrap();
    oracle.verify_cursor_slicing(CursorSlice::After, None).await.unwrap();
    oracle.verify_cursor_slicing(CursorSlice::Before, None).await.unwrap();
}

#[tokio::test]
async fn test_inclusive_after_is_detected() {
    // Five items fit one page, so the full scan itself never pages with `after`
    let (_, oracle) = oracle_for(quirky(5, ConnectionQuirks {
        inclusive_after: true,
        ..Default::default()
    }));
    let err = oracle.verify_cursor_slicing(CursorSlice::After, Some(2)).await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "cursor_slice_position");
}

#[tokio::test]
async fn test_cursor_slicing_needs_items() {
    let (_, oracle) = oracle_for(conformant(0));
    let err = oracle.verify_cursor_slicing(CursorSlice::After, Some(1)).await.unwrap_err();
    assert!(matches!(err, ProbeError::Validation(_)));
}

#[tokio::test]
async fn test_combined_cursor_errors() {
    let (api, oracle) = oracle_for(conformant(5));
    oracle.verify_cursor_paging_combined_errors().await.unwrap();
    assert!(api.requests().iter().any(|q| q.contains("!!not-a-cursor!!")));
}

#[tokio::test]
async fn test_lenient_cursors_are_detected() {
    let (_, oracle) = oracle_for(quirky(5, ConnectionQuirks {
        lenient_cursors: true,
        ..Default::default()
    }));
    let err = oracle.verify_cursor_paging_combined_errors().await.unwrap_err();
    assert_violation(err, FailureKind::ContractViolation, "has_graphql_errors");
}

#[tokio::test]
async fn test_search_matches_and_partial_superset() {
    let (api, oracle) = oracle_for(conformant(12));
    oracle.verify_search("summer").await.unwrap();
    assert!(api.requests().iter().any(|q| q.contains("searchString: \"sum\"")));
}

#[tokio::test]
async fn test_search_without_matches_fails() {
    let (_, oracle) = oracle_for(conformant(12));
    let err = oracle.verify_search("nonexistent").await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "search_finds_match");
}

#[tokio::test]
async fn test_ignored_search_is_detected() {
    let (_, oracle) = oracle_for(quirky(4, ConnectionQuirks {
        ignore_search: true,
        ..Default::default()
    }));
    let err = oracle.verify_search("summer").await.unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "search_matches_term");
}

#[tokio::test]
async fn test_blank_search_term_is_usage_error() {
    let (_, oracle) = oracle_for(conformant(3));
    let err = oracle.verify_search("  ").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Usage);
}

#[tokio::test]
async fn test_custom_data_passthrough() {
    let api = conformant(3);
    api.insert(TestDataFactory::discount(
        "d-custom",
        "Loyalty",
        1_800_000_000,
        json!({ "campaign": "spring", "tiers": [1, 2] }),
    ));
    let (_, oracle) = oracle_for(api);

    oracle
        .verify_custom_data_passthrough("d-custom", &json!({ "campaign": "spring", "tiers": [1, 2] }))
        .await
        .unwrap();

    let err = oracle
        .verify_custom_data_passthrough("d-custom", &json!({ "campaign": "autumn" }))
        .await
        .unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "custom_data_roundtrip");

    let err = oracle
        .verify_custom_data_passthrough("d-missing", &json!({}))
        .await
        .unwrap_err();
    assert_violation(err, FailureKind::InvariantViolation, "custom_data_item_present");
}

#[tokio::test]
async fn test_custom_data_serialized_as_string() {
    let api = quirky(2, ConnectionQuirks {
        custom_data_as_string: true,
        ..Default::default()
    });
    let (_, oracle) = oracle_for(api);
    oracle
        .verify_custom_data_passthrough("d-001", &json!({ "batch": 0, "tag": "t1" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failure_message_carries_query_and_response() {
    let (_, oracle) = oracle_for(quirky(4, ConnectionQuirks {
        broken_duality: true,
        ..Default::default()
    }));
    let message = oracle.verify_shape().await.unwrap_err().to_string();
    assert!(message.contains("discounts(orderBy: {direction: ASC, field: TIMESTAMP})"));
    assert!(message.contains("response: 200 "));
}
