// Response assertion primitives
//
// Pure predicates over responses and JSON values. No I/O, no panics.

use serde_json::Value;

use crate::modules::graphql::GraphqlResponse;

/// HTTP status is 2xx
pub fn is_transport_success(response: &GraphqlResponse) -> bool {
    response.status_ok()
}

/// Body carries no (or an empty) `errors` list
pub fn has_no_graphql_errors(response: &GraphqlResponse) -> bool {
    response.errors().is_none()
}

/// Body carries a non-empty `errors` list
pub fn has_graphql_errors(response: &GraphqlResponse) -> bool {
    !has_no_graphql_errors(response)
}

/// Body carries a non-null `data` member
pub fn has_data(response: &GraphqlResponse) -> bool {
    response.data().is_some()
}

/// Request rejected at the GraphQL protocol layer: errors present, data absent
pub fn is_protocol_rejection(response: &GraphqlResponse) -> bool {
    has_graphql_errors(response) && !has_data(response)
}

pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

pub fn is_number(value: &Value) -> bool {
    value.is_number()
}

/// Value exists and is not JSON `null`
pub fn is_non_null(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

/// Case-insensitive substring test; an empty needle always matches
pub fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Look up a dotted path such as `data.discounts.totalCount` or `edges.0.node`
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Identifier of an item: its `id` member as a string (numeric ids are stringified)
pub fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
