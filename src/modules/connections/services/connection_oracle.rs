// Connection conformance oracle
//
// Drives a sequence of requests against one Relay-style connection field and
// fails on the first broken invariant. Checks are independent methods so a
// scenario can run any subset; `run_all` runs them in dependency order.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::OracleConfig;
use crate::core::{ProbeError, Result};
use crate::modules::assertions::{
    contains_case_insensitive, ensure, expect_rejection, expect_success, invariant_violation,
    value_at,
};
use crate::modules::connections::models::{
    parse_total_count, ConnectionQuerySpec, ConnectionResult, ConnectionSelection, Edge, OrderBy,
    OrderDirection, PageRequest,
};
use crate::modules::graphql::{ArgValue, GraphqlResponse, GraphqlTransport, Headers};

const INVALID_CURSOR: &str = "!!not-a-cursor!!";

/// Side of a cursor to slice from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSlice {
    Before,
    After,
}

/// A successfully fetched page together with the exchange that produced it
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub query: String,
    pub response: GraphqlResponse,
    pub page: ConnectionResult,
}

/// Where a forward scan stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanBound<'a> {
    /// Every item; the connection must fit the full scan limit
    Complete,
    /// At most this many items from the start of the ordering
    Window(u64),
    /// Up to and including the item with this id
    Item(&'a str),
}

/// Ordered forward scan over a connection, or over a prefix of it
#[derive(Debug, Clone)]
pub struct OrderedScan {
    pub edges: Vec<Edge>,
    pub total_count: u64,
    /// Whether the scan reached the end of the connection
    pub complete: bool,
    /// Last query of the scan, used in failure reports
    pub query: String,
    pub response: GraphqlResponse,
}

impl OrderedScan {
    pub fn ids(&self) -> Vec<String> {
        self.edges.iter().map(|e| e.id().unwrap_or_default()).collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.edges.iter().position(|e| e.id().as_deref() == Some(id))
    }
}

/// Verifies that a connection field obeys the Relay cursor-pagination contract
pub struct ConnectionOracle {
    transport: Arc<dyn GraphqlTransport>,
    spec: ConnectionQuerySpec,
    headers: Headers,
    full_scan_limit: u32,
}

impl ConnectionOracle {
    pub fn new(transport: Arc<dyn GraphqlTransport>, spec: ConnectionQuerySpec) -> Self {
        Self {
            transport,
            spec,
            headers: Headers::new(),
            full_scan_limit: OracleConfig::default().full_scan_limit,
        }
    }

    pub fn with_config(mut self, config: &OracleConfig) -> Self {
        self.full_scan_limit = config.full_scan_limit;
        self
    }

    pub fn with_full_scan_limit(mut self, limit: u32) -> Self {
        self.full_scan_limit = limit;
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn spec(&self) -> &ConnectionQuerySpec {
        &self.spec
    }

    async fn send(
        &self,
        request: &PageRequest,
        selection: ConnectionSelection,
    ) -> Result<(String, GraphqlResponse)> {
        let query = self.spec.operation(request, selection).render();
        debug!(field = %self.spec.field_name, query = %query, "Connection probe request");
        let response = self.transport.post(&query, &self.headers).await?;
        Ok((query, response))
    }

    /// Fetch one page with the full selection and require success
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage> {
        let (query, response) = self.send(request, ConnectionSelection::Full).await?;
        let data = expect_success(&query, &response)?;
        let page = ConnectionResult::parse(&self.spec.field_name, data, &query, &response)?;
        Ok(FetchedPage { query, response, page })
    }

    /// `totalCount` under the given order
    pub async fn total_count(&self, order: &OrderBy) -> Result<u64> {
        let (query, response) = self
            .send(&PageRequest::ordered(order), ConnectionSelection::TotalCount)
            .await?;
        let data = expect_success(&query, &response)?;
        parse_total_count(&self.spec.field_name, data, &query, &response)
    }

    async fn expect_rejected(
        &self,
        request: &PageRequest,
        selection: ConnectionSelection,
    ) -> Result<()> {
        let (query, response) = self.send(request, selection).await?;
        expect_rejection(&query, &response)
    }

    /// Page forward through the whole connection with `first`/`after`
    ///
    /// Every page must make progress, ids must not repeat, and the scan must
    /// end with exactly `totalCount` items.
    pub async fn fetch_all(&self, base: &PageRequest) -> Result<OrderedScan> {
        self.scan(base, ScanBound::Complete).await
    }

    /// Page forward until `full_scan_limit` items are collected or the connection ends
    ///
    /// The reference ordering for checks that must also work on connections
    /// larger than the limit.
    pub async fn fetch_window(&self, base: &PageRequest) -> Result<OrderedScan> {
        self.scan(base, ScanBound::Window(u64::from(self.full_scan_limit)))
            .await
    }

    async fn scan(&self, base: &PageRequest, bound: ScanBound<'_>) -> Result<OrderedScan> {
        let page_size = self.spec.default_page_size;
        let mut edges: Vec<Edge> = Vec::new();
        let mut seen = HashSet::new();
        let mut after: Option<String> = None;
        let mut expected_total = None;

        loop {
            let mut request = base.clone().first(page_size);
            if let Some(cursor) = &after {
                request = request.after(cursor.clone());
            }
            let fetched = self.fetch_page(&request).await?;
            let FetchedPage { query, response, page } = fetched;

            let total = *expected_total.get_or_insert(page.total_count);
            if bound == ScanBound::Complete && total > u64::from(self.full_scan_limit) {
                return Err(ProbeError::validation(format!(
                    "'{}' has {} items, more than the full scan limit of {}",
                    self.spec.field_name, total, self.full_scan_limit
                )));
            }

            ensure(
                !(page.edges.is_empty() && page.page_info.has_next_page),
                "page_progress",
                &query,
                &response,
                || "empty page reports hasNextPage = true".to_string(),
            )?;

            for edge in page.edges {
                let id = edge.id().ok_or_else(|| {
                    invariant_violation("node_has_id", "edge node without an id", &query, &response)
                })?;
                if !seen.insert(id.clone()) {
                    return Err(invariant_violation(
                        "scan_ids_unique",
                        format!("id {} returned twice while paging forward", id),
                        &query,
                        &response,
                    ));
                }
                edges.push(edge);
            }

            ensure(
                edges.len() as u64 <= total,
                "scan_matches_total_count",
                &query,
                &response,
                || format!("scan returned {} items but totalCount is {}", edges.len(), total),
            )?;

            let reached = match bound {
                ScanBound::Complete => false,
                ScanBound::Window(size) => edges.len() as u64 >= size,
                ScanBound::Item(id) => seen.contains(id),
            };
            if reached {
                if let ScanBound::Window(size) = bound {
                    edges.truncate(size as usize);
                }
                let complete = edges.len() as u64 == total && !page.page_info.has_next_page;
                return Ok(OrderedScan {
                    edges,
                    total_count: total,
                    complete,
                    query,
                    response,
                });
            }

            if !page.page_info.has_next_page {
                ensure(
                    edges.len() as u64 == total,
                    "scan_matches_total_count",
                    &query,
                    &response,
                    || {
                        format!(
                            "scan ended after {} items but totalCount is {}",
                            edges.len(),
                            total
                        )
                    },
                )?;
                return Ok(OrderedScan {
                    edges,
                    total_count: total,
                    complete: true,
                    query,
                    response,
                });
            }

            match page.page_info.end_cursor {
                Some(cursor) => after = Some(cursor),
                None => {
                    return Err(invariant_violation(
                        "end_cursor_present",
                        "hasNextPage = true but endCursor is null",
                        &query,
                        &response,
                    ))
                }
            }
        }
    }

    /// Omitting `orderBy`, or either of its members, must be rejected
    pub async fn require_order_by_mandatory(&self) -> Result<()> {
        let order = self.spec.default_order();
        let requests = [
            PageRequest::unordered(),
            PageRequest::direction_only(OrderDirection::Asc),
            PageRequest::field_only(&order.field),
        ];
        for request in &requests {
            self.expect_rejected(request, ConnectionSelection::TotalCount).await?;
        }
        self.passed("require_order_by_mandatory");
        Ok(())
    }

    /// Full selection succeeds with the Relay shape and nodes/edges duality
    pub async fn verify_shape(&self) -> Result<ConnectionResult> {
        let fetched = self
            .fetch_page(&PageRequest::ordered(&self.spec.default_order()))
            .await?;
        let FetchedPage { query, response, page } = fetched;

        ensure(
            page.nodes.len() == page.edges.len(),
            "duality",
            &query,
            &response,
            || format!("{} nodes but {} edges", page.nodes.len(), page.edges.len()),
        )?;
        if let Some(i) = page.duality_mismatch() {
            return Err(invariant_violation(
                "duality",
                format!("edges[{}].node.id does not match nodes[{}].id", i, i),
                &query,
                &response,
            ));
        }

        self.passed("verify_shape");
        Ok(page)
    }

    /// Without `first`/`last` the page holds `min(totalCount, defaultPageSize)` items
    pub async fn verify_default_page_size(&self) -> Result<()> {
        let FetchedPage { query, response, page } = self
            .fetch_page(&PageRequest::ordered(&self.spec.default_order()))
            .await?;
        let expected = page.total_count.min(u64::from(self.spec.default_page_size));
        ensure(
            page.len() as u64 == expected,
            "default_page_size",
            &query,
            &response,
            || {
                format!(
                    "expected {} items (totalCount {}, default page size {}), got {}",
                    expected,
                    page.total_count,
                    self.spec.default_page_size,
                    page.len()
                )
            },
        )?;
        self.passed("verify_default_page_size");
        Ok(())
    }

    /// `first: n` returns `min(n, totalCount)` items on a page with no previous page
    pub async fn verify_first(&self, n: u32) -> Result<()> {
        let FetchedPage { query, response, page } = self
            .fetch_page(&PageRequest::ordered(&self.spec.default_order()).first(n))
            .await?;
        let expected = page.total_count.min(u64::from(n));
        ensure(
            page.len() as u64 == expected,
            "first_count",
            &query,
            &response,
            || format!("first: {} expected {} items, got {}", n, expected, page.len()),
        )?;
        ensure(
            !page.page_info.has_previous_page,
            "first_page_has_no_previous",
            &query,
            &response,
            || "first page reports hasPreviousPage = true".to_string(),
        )?;
        self.passed("verify_first");
        Ok(())
    }

    /// `last: n` returns `min(n, totalCount)` items on a page with no next page
    pub async fn verify_last(&self, n: u32) -> Result<()> {
        let FetchedPage { query, response, page } = self
            .fetch_page(&PageRequest::ordered(&self.spec.default_order()).last(n))
            .await?;
        let expected = page.total_count.min(u64::from(n));
        ensure(
            page.len() as u64 == expected,
            "last_count",
            &query,
            &response,
            || format!("last: {} expected {} items, got {}", n, expected, page.len()),
        )?;
        ensure(
            !page.page_info.has_next_page,
            "last_page_has_no_next",
            &query,
            &response,
            || "last page reports hasNextPage = true".to_string(),
        )?;
        self.passed("verify_last");
        Ok(())
    }

    /// Negative or non-numeric sizes, and `first` together with `last`, are rejected
    pub async fn verify_invalid_paging(&self) -> Result<()> {
        let ordered = PageRequest::ordered(&self.spec.default_order());
        let requests = [
            ordered.clone().first_raw(ArgValue::Int(-1)),
            ordered.clone().first_raw(ArgValue::from("ten")),
            ordered.clone().last_raw(ArgValue::Int(-1)),
            ordered.clone().last_raw(ArgValue::from("ten")),
            ordered.clone().first(1).last(1),
        ];
        for request in &requests {
            self.expect_rejected(request, ConnectionSelection::Full).await?;
        }
        self.passed("verify_invalid_paging");
        Ok(())
    }

    /// Ascending and descending orderings on `field` are exact reverses
    ///
    /// Compares full scans when the connection fits the scan limit, otherwise
    /// compares `first: limit` ascending with `last: limit` descending.
    pub async fn verify_order_reversal(&self, field: &str) -> Result<()> {
        let asc = OrderBy::asc(field);
        let desc = OrderBy::desc(field);
        let total = self.total_count(&asc).await?;

        let (asc_ids, desc_ids, query, response) = if total <= u64::from(self.full_scan_limit) {
            let asc_scan = self.fetch_all(&PageRequest::ordered(&asc)).await?;
            let desc_scan = self.fetch_all(&PageRequest::ordered(&desc)).await?;
            let query = format!("{}\n  {}", asc_scan.query, desc_scan.query);
            (asc_scan.ids(), desc_scan.ids(), query, desc_scan.response)
        } else {
            let window = self.full_scan_limit;
            let head = self.fetch_page(&PageRequest::ordered(&asc).first(window)).await?;
            let tail = self.fetch_page(&PageRequest::ordered(&desc).last(window)).await?;
            let ids = |page: &ConnectionResult| -> Vec<String> {
                page.node_ids().into_iter().map(Option::unwrap_or_default).collect()
            };
            let query = format!("{}\n  {}", head.query, tail.query);
            (ids(&head.page), ids(&tail.page), query, tail.response)
        };

        let mut reversed = desc_ids.clone();
        reversed.reverse();
        ensure(asc_ids == reversed, "order_reversal", &query, &response, || {
            format!(
                "ASC order {:?} is not the reverse of DESC order {:?} for field {}",
                asc_ids, desc_ids, field
            )
        })?;

        info!(
            field = %self.spec.field_name,
            order_field = field,
            items = asc_ids.len(),
            "Order reversal holds"
        );
        Ok(())
    }

    /// Items returned around a captured cursor lie strictly on the requested side of it
    ///
    /// The pivot is the middle of the first `full_scan_limit` items. On a larger
    /// connection, `after` results may also lie past the end of that window, in
    /// which case every later result must too.
    pub async fn verify_cursor_slicing(&self, slice: CursorSlice, size: Option<u32>) -> Result<()> {
        let order = self.spec.default_order();
        let scan = self.fetch_window(&PageRequest::ordered(&order)).await?;
        if scan.edges.is_empty() {
            return Err(ProbeError::validation(format!(
                "'{}' has no items to slice around",
                self.spec.field_name
            )));
        }

        let pivot = scan.edges.len() / 2;
        let cursor = scan.edges[pivot].cursor.clone();
        let mut request = PageRequest::ordered(&order);
        request = match (slice, size) {
            (CursorSlice::After, Some(n)) => request.after(cursor).first(n),
            (CursorSlice::After, None) => request.after(cursor),
            (CursorSlice::Before, Some(n)) => request.before(cursor).last(n),
            (CursorSlice::Before, None) => request.before(cursor),
        };

        let FetchedPage { query, response, page } = self.fetch_page(&request).await?;

        if let Some(n) = size {
            ensure(
                page.len() as u64 <= u64::from(n),
                "cursor_slice_size_bound",
                &query,
                &response,
                || format!("requested at most {} items, got {}", n, page.len()),
            )?;
        }

        // Position shared by every item past the end of a partial window
        let beyond = scan.edges.len();
        let mut previous: Option<usize> = None;
        for id in page.node_ids() {
            let id = id.unwrap_or_default();
            let position = match scan.position(&id) {
                Some(position) => position,
                None if slice == CursorSlice::After && !scan.complete => beyond,
                None => {
                    return Err(invariant_violation(
                        "cursor_slice_known_items",
                        format!("item {} is not part of the reference ordering", id),
                        &query,
                        &response,
                    ))
                }
            };
            let on_side = match slice {
                CursorSlice::After => position > pivot,
                CursorSlice::Before => position < pivot,
            };
            ensure(on_side, "cursor_slice_position", &query, &response, || {
                format!(
                    "item {} at position {} is not {:?} the cursor at position {}",
                    id, position, slice, pivot
                )
            })?;
            ensure(
                previous.map_or(true, |p| p < position || (p == beyond && position == beyond)),
                "cursor_slice_order",
                &query,
                &response,
                || format!("item {} at position {} breaks the ordering", id, position),
            )?;
            previous = Some(position);
        }

        self.passed("verify_cursor_slicing");
        Ok(())
    }

    /// `before` with `after` fails, and a malformed cursor fails even with a valid size
    pub async fn verify_cursor_paging_combined_errors(&self) -> Result<()> {
        let order = self.spec.default_order();
        let FetchedPage { page, .. } = self
            .fetch_page(&PageRequest::ordered(&order).first(2))
            .await?;
        let (first_cursor, last_cursor) = match (page.edges.first(), page.edges.last()) {
            (Some(first), Some(last)) => (first.cursor.clone(), last.cursor.clone()),
            _ => {
                return Err(ProbeError::validation(format!(
                    "'{}' has no items to capture cursors from",
                    self.spec.field_name
                )))
            }
        };

        let requests = [
            PageRequest::ordered(&order).after(first_cursor).before(last_cursor),
            PageRequest::ordered(&order).after(INVALID_CURSOR).first(1),
            PageRequest::ordered(&order).before(INVALID_CURSOR).last(1),
        ];
        for request in &requests {
            self.expect_rejected(request, ConnectionSelection::Full).await?;
        }
        self.passed("verify_cursor_paging_combined_errors");
        Ok(())
    }

    /// `searchString` returns only matching items, and a partial term matches a superset
    pub async fn verify_search(&self, term: &str) -> Result<()> {
        if term.trim().is_empty() {
            return Err(ProbeError::validation("search term must not be empty"));
        }
        let order = self.spec.default_order();
        let FetchedPage { query, response, page } = self
            .fetch_page(&PageRequest::ordered(&order).search(term))
            .await?;

        ensure(
            page.total_count == page.nodes.len() as u64 && page.nodes.len() == page.edges.len(),
            "search_counts_consistent",
            &query,
            &response,
            || {
                format!(
                    "totalCount {}, nodes {}, edges {}",
                    page.total_count,
                    page.nodes.len(),
                    page.edges.len()
                )
            },
        )?;
        ensure(!page.is_empty(), "search_finds_match", &query, &response, || {
            format!("no item matches '{}'", term)
        })?;

        for node in &page.nodes {
            let text = value_at(node, &self.spec.search_field)
                .and_then(Value::as_str)
                .unwrap_or_default();
            ensure(
                contains_case_insensitive(text, term),
                "search_matches_term",
                &query,
                &response,
                || format!("{} = '{}' does not contain '{}'", self.spec.search_field, text, term),
            )?;
        }

        let partial = partial_term(term);
        let scan = self
            .fetch_window(&PageRequest::ordered(&order).search(partial.clone()))
            .await?;
        ensure(
            scan.total_count >= page.total_count,
            "search_partial_superset",
            &scan.query,
            &scan.response,
            || {
                format!(
                    "'{}' matches {} items but '{}' only {}",
                    term, page.total_count, partial, scan.total_count
                )
            },
        )?;
        if !scan.complete {
            // Too many partial matches to compare item by item
            self.passed("verify_search");
            return Ok(());
        }
        let partial_ids: HashSet<String> = scan.ids().into_iter().collect();
        for id in page.node_ids() {
            let id = id.unwrap_or_default();
            ensure(
                partial_ids.contains(&id),
                "search_partial_superset",
                &scan.query,
                &scan.response,
                || format!("item {} matches '{}' but not '{}'", id, term, partial),
            )?;
        }

        self.passed("verify_search");
        Ok(())
    }

    /// The opaque custom data of item `id` equals what was supplied at creation
    ///
    /// Pages forward only until the item is found.
    pub async fn verify_custom_data_passthrough(&self, id: &str, expected: &Value) -> Result<()> {
        let scan = self
            .scan(&PageRequest::ordered(&self.spec.default_order()), ScanBound::Item(id))
            .await?;
        let position = scan.position(id).ok_or_else(|| {
            invariant_violation(
                "custom_data_item_present",
                format!("item {} not found in '{}'", id, self.spec.field_name),
                &scan.query,
                &scan.response,
            )
        })?;

        let actual = scan.edges[position]
            .node
            .get(&self.spec.custom_data_field)
            .cloned()
            .unwrap_or(Value::Null);
        let actual = normalize_custom_data(actual, expected);
        ensure(
            &actual == expected,
            "custom_data_roundtrip",
            &scan.query,
            &scan.response,
            || {
                format!(
                    "{} is {} but {} was supplied",
                    self.spec.custom_data_field, actual, expected
                )
            },
        )?;

        self.passed("verify_custom_data_passthrough");
        Ok(())
    }

    /// Every check in dependency order, stopping at the first failure
    pub async fn run_all(&self, search_term: Option<&str>) -> Result<()> {
        self.require_order_by_mandatory().await?;
        self.verify_shape().await?;
        self.verify_default_page_size().await?;
        self.verify_first(1).await?;
        self.verify_last(1).await?;
        self.verify_invalid_paging().await?;
        for field in self.spec.orderable_fields.clone() {
            self.verify_order_reversal(&field).await?;
        }
        self.verify_cursor_slicing(CursorSlice::After, Some(2)).await?;
        self.verify_cursor_slicing(CursorSlice::Before, Some(2)).await?;
        self.verify_cursor_paging_combined_errors().await?;
        if let Some(term) = search_term {
            self.verify_search(term).await?;
        }
        Ok(())
    }

    fn passed(&self, check: &'static str) {
        info!(field = %self.spec.field_name, check, "Connection check passed");
    }
}

/// Leading half of the term (at least one character)
fn partial_term(term: &str) -> String {
    let chars: Vec<char> = term.trim().chars().collect();
    let keep = ((chars.len() + 1) / 2).max(1);
    chars[..keep].iter().collect()
}

/// Custom data stored as a JSON string is decoded when the expectation is structured
fn normalize_custom_data(actual: Value, expected: &Value) -> Value {
    match (&actual, expected) {
        (Value::String(raw), expected) if !expected.is_string() => {
            serde_json::from_str(raw).unwrap_or(actual)
        }
        _ => actual,
    }
}
