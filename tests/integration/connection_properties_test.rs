// Property tests: a conformant connection passes the oracle for any item
// count and page size, and paging forward always yields totalCount items.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use gqlprobe::connections::{ConnectionOracle, CursorSlice, OrderBy, PageRequest};
use helpers::*;
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn oracle(count: usize, page_size: u32) -> ConnectionOracle {
    let api = FakeConnectionApi::new("discounts", TestDataFactory::discounts(count))
        .with_default_page_size(page_size as usize);
    ConnectionOracle::new(Arc::new(api), TestDataFactory::discount_spec_with_page_size(page_size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_scan_returns_every_item(count in 0usize..40, page_size in 1u32..12) {
        let oracle = oracle(count, page_size);
        let scan = block_on(oracle.fetch_all(&PageRequest::ordered(&OrderBy::asc("TIMESTAMP")))).unwrap();
        prop_assert_eq!(scan.edges.len(), count);
    }

    #[test]
    fn prop_descending_scan_reverses_ascending(count in 0usize..30, page_size in 1u32..8) {
        let oracle = oracle(count, page_size);
        block_on(oracle.verify_order_reversal("TIMESTAMP")).unwrap();
        block_on(oracle.verify_order_reversal("NAME")).unwrap();
    }

    #[test]
    fn prop_cursor_slices_stay_on_their_side(count in 1usize..30, size in 0u32..6) {
        let oracle = oracle(count, 7);
        block_on(oracle.verify_cursor_slicing(CursorSlice::After, Some(size))).unwrap();
        block_on(oracle.verify_cursor_slicing(CursorSlice::Before, Some(size))).unwrap();
    }

    #[test]
    fn prop_first_and_last_are_bounded(count in 0usize..20, n in 0u32..25) {
        let oracle = oracle(count, 5);
        block_on(oracle.verify_first(n)).unwrap();
        block_on(oracle.verify_last(n)).unwrap();
        block_on(oracle.verify_default_page_size()).unwrap();
    }
}
