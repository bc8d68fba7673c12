// Unit tests for the typed query builder
//
// Rendered text is read back with the test query parser, so these also pin
// down that every argument value survives rendering intact.

#[path = "../helpers/mod.rs"]
mod helpers;

use gqlprobe::connections::{ConnectionSelection, OrderBy, OrderDirection, PageRequest};
use gqlprobe::graphql::{ArgValue, Field, Operation};
use helpers::*;
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn test_page_request_renders_all_paging_arguments() {
    let spec = TestDataFactory::discount_spec();
    let request = PageRequest::ordered(&OrderBy::desc("NAME"))
        .last(3)
        .before("Y3Vyc29yOmQtMDAx")
        .search("summer");

    let parsed = parse_request(&spec.operation(&request, ConnectionSelection::Full).render())
        .expect("rendered query parses");

    assert!(!parsed.mutation);
    assert_eq!(parsed.field, "discounts");
    assert_eq!(parsed.args["orderBy"], json!({ "direction": "DESC", "field": "NAME" }));
    assert_eq!(parsed.args["last"], json!(3));
    assert_eq!(parsed.args["before"], json!("Y3Vyc29yOmQtMDAx"));
    assert_eq!(parsed.args["searchString"], json!("summer"));
    assert!(!parsed.args.contains_key("first"));
    assert!(parsed.selects("pageInfo"));
    assert!(parsed.selects("hasPreviousPage"));
}

#[test]
fn test_total_count_selection_is_minimal() {
    let spec = TestDataFactory::discount_spec();
    let query = spec
        .operation(&PageRequest::ordered(&spec.default_order()), ConnectionSelection::TotalCount)
        .render();
    let parsed = parse_request(&query).unwrap();
    assert!(parsed.selects("totalCount"));
    assert!(!parsed.selects("edges"));
}

#[test]
fn test_incomplete_order_by_variants() {
    let spec = TestDataFactory::discount_spec();
    let render = |request: &PageRequest| {
        parse_request(&spec.operation(request, ConnectionSelection::TotalCount).render()).unwrap()
    };

    assert!(!render(&PageRequest::unordered()).args.contains_key("orderBy"));
    assert_eq!(
        render(&PageRequest::direction_only(OrderDirection::Desc)).args["orderBy"],
        json!({ "direction": "DESC" })
    );
    assert_eq!(
        render(&PageRequest::field_only("TIMESTAMP")).args["orderBy"],
        json!({ "field": "TIMESTAMP" })
    );
}

#[test]
fn test_raw_size_values_render_unvalidated() {
    let spec = TestDataFactory::discount_spec();
    let request = PageRequest::ordered(&spec.default_order())
        .first_raw(ArgValue::Int(-1))
        .last_raw(ArgValue::from("ten"));
    let parsed = parse_request(&spec.operation(&request, ConnectionSelection::Full).render()).unwrap();
    assert_eq!(parsed.args["first"], json!(-1));
    assert_eq!(parsed.args["last"], json!("ten"));
}

#[test]
fn test_order_by_reversal() {
    let asc = OrderBy::asc("TIMESTAMP");
    assert_eq!(asc.reversed(), OrderBy::desc("TIMESTAMP"));
    assert_eq!(asc.reversed().reversed(), asc);
    assert_eq!(asc.to_arg().to_string(), "{direction: ASC, field: TIMESTAMP}");
}

#[test]
fn test_mutation_with_input_object() {
    let input = json!({ "name": "Summer \"Sale\"", "percentage": 15, "active": true, "tags": ["a", "b"] });
    let op = Operation::mutation(
        Field::new("createDiscount")
            .arg("input", &input)
            .select_raw("code discount {id}"),
    );
    let parsed = parse_request(&op.render()).unwrap();
    assert!(parsed.mutation);
    assert_eq!(parsed.field, "createDiscount");
    assert_eq!(parsed.args["input"], input);
    assert!(parsed.selects("discount"));
}

proptest! {
    #[test]
    fn prop_string_arguments_survive_rendering(text in "\\PC{0,40}") {
        let op = Operation::query(Field::new("discounts").arg("searchString", text.as_str()).select_all(["totalCount"]));
        let parsed = parse_request(&op.render()).unwrap();
        prop_assert_eq!(&parsed.args["searchString"], &Value::String(text));
    }

    #[test]
    fn prop_integer_arguments_survive_rendering(n in any::<i64>()) {
        let op = Operation::query(Field::new("discounts").arg("first", n).select_all(["totalCount"]));
        let parsed = parse_request(&op.render()).unwrap();
        prop_assert_eq!(&parsed.args["first"], &json!(n));
    }
}
