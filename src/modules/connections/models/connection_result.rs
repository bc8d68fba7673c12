use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Result;
use crate::modules::assertions::{
    contract_violation, expect_shape, is_array, is_number, is_object, item_id,
};
use crate::modules::graphql::GraphqlResponse;

/// Relay `pageInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Relay edge: cursor plus node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub cursor: String,
    pub node: Value,
}

impl Edge {
    pub fn id(&self) -> Option<String> {
        item_id(&self.node)
    }
}

/// One page of a connection as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub nodes: Vec<Value>,
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

impl ConnectionResult {
    /// Extract `data.<field_key>` and check the connection wire shape
    pub fn parse(
        field_key: &str,
        data: &Value,
        query: &str,
        response: &GraphqlResponse,
    ) -> Result<Self> {
        let connection = expect_shape(
            data.get(field_key),
            is_object,
            "is_object",
            field_key,
            query,
            response,
        )?;

        expect_shape(connection.get("nodes"), is_array, "is_array", "nodes", query, response)?;
        expect_shape(connection.get("edges"), is_array, "is_array", "edges", query, response)?;
        expect_shape(
            connection.get("pageInfo"),
            is_object,
            "is_object",
            "pageInfo",
            query,
            response,
        )?;
        let total = expect_shape(
            connection.get("totalCount"),
            is_number,
            "is_number",
            "totalCount",
            query,
            response,
        )?;
        if total.as_u64().is_none() {
            return Err(contract_violation(
                "total_count_non_negative_integer",
                format!("totalCount must be a non-negative integer, got {}", total),
                query,
                response,
            ));
        }

        serde_json::from_value(connection.clone()).map_err(|e| {
            contract_violation(
                "connection_wire_shape",
                format!("connection does not match the Relay wire shape: {}", e),
                query,
                response,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of `nodes`, in order; items without an id map to `None`
    pub fn node_ids(&self) -> Vec<Option<String>> {
        self.nodes.iter().map(item_id).collect()
    }

    /// First index where `edges[i].node.id != nodes[i].id`, or a length mismatch
    pub fn duality_mismatch(&self) -> Option<usize> {
        if self.nodes.len() != self.edges.len() {
            return Some(self.nodes.len().min(self.edges.len()));
        }
        self.nodes
            .iter()
            .zip(&self.edges)
            .position(|(node, edge)| item_id(node).is_none() || item_id(node) != edge.id())
    }
}

/// `totalCount` from a totalCount-only selection
pub fn parse_total_count(
    field_key: &str,
    data: &Value,
    query: &str,
    response: &GraphqlResponse,
) -> Result<u64> {
    let total = expect_shape(
        data.get(field_key).and_then(|c| c.get("totalCount")),
        is_number,
        "is_number",
        "totalCount",
        query,
        response,
    )?;
    total.as_u64().ok_or_else(|| {
        contract_violation(
            "total_count_non_negative_integer",
            format!("totalCount must be a non-negative integer, got {}", total),
            query,
            response,
        )
    })
}
