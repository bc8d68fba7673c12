// Test Data Factory
//
// Item sets, specs and mutations shared by the oracle tests.

use gqlprobe::connections::ConnectionQuerySpec;
use gqlprobe::graphql::{Field, Operation};
use serde_json::{json, Value};
use uuid::Uuid;

use super::fake_api::FakeItem;

const NAMES: [&str; 6] = ["Summer Sale", "Winter Clearance", "summer-kids", "Spring Promo", "Autumn Deal", "Flash"];

pub struct TestDataFactory;

impl TestDataFactory {
    /// Unique payment id in format "pay_{uuid}"
    pub fn random_payment_id() -> String {
        format!("pay_{}", Uuid::new_v4().simple())
    }

    /// `count` discounts with distinct ids; names repeat so NAME ordering has ties
    pub fn discounts(count: usize) -> Vec<FakeItem> {
        (0..count)
            .map(|i| FakeItem {
                id: format!("d-{:03}", i),
                name: NAMES[i % NAMES.len()].to_string(),
                // Interleave timestamps so TIMESTAMP order differs from id order
                timestamp: 1_700_000_000 + ((i * 7) % count) as i64,
                custom_data: json!({ "batch": i / 5, "tag": format!("t{}", i) }),
            })
            .collect()
    }

    pub fn discount(id: &str, name: &str, timestamp: i64, custom_data: Value) -> FakeItem {
        FakeItem {
            id: id.to_string(),
            name: name.to_string(),
            timestamp,
            custom_data,
        }
    }

    pub fn discount_spec() -> ConnectionQuerySpec {
        Self::discount_spec_with_page_size(25)
    }

    pub fn discount_spec_with_page_size(page_size: u32) -> ConnectionQuerySpec {
        ConnectionQuerySpec::builder("discounts")
            .node_selection("id name timestamp customData")
            .orderable("TIMESTAMP")
            .orderable("NAME")
            .default_page_size(page_size)
            .build()
            .expect("valid discount spec")
    }

    pub fn refund_mutation(payment_id: &str, amount: i64) -> Operation {
        Operation::mutation(
            Field::new("createRefund")
                .arg("paymentId", payment_id)
                .arg("amount", amount)
                .select_raw("code message refund {id}"),
        )
    }

    pub fn delete_refund(id: &str) -> Operation {
        Operation::delete_by_id("deleteRefund", id, "code message")
    }

    pub fn status_query(id: &str) -> Operation {
        Operation::query(Field::new("refund").arg("id", id).select_raw("status"))
    }
}
