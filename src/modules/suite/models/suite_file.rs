// YAML suite file
//
// Enumerates the connection fields and mutations a run should probe.
//
// connections:
//   - field: discounts
//     node_selection: "id name customData"
//     orderable_fields: [TIMESTAMP, NAME]
//     search_term: summer
//     custom_data:
//       - id: d-7
//         expected: { tier: gold }
// missing_key_checks:
//   - mutation:
//       field: createRefund
//       arguments: { paymentId: "pay_1", amount: 100 }
//       selection: "code"
// idempotency_probes:
//   - name: refund
//     mutation:
//       field: createRefund
//       arguments: { paymentId: "pay_2", amount: 100 }
//       selection: "code refund { id }"
//     resource_id_path: refund.id
//     teardown: { field: deleteRefund }

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ProbeError, Result};
use crate::modules::assertions::DomainCodeRule;
use crate::modules::connections::ConnectionQuerySpec;
use crate::modules::graphql::{ArgValue, Field, Operation};
use crate::modules::idempotency::{ExpectedFirstOutcome, ExpectedRepeatOutcome, KeyStrategy};

/// Connection field to run through the connection oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCase {
    pub field: String,
    #[serde(default = "default_node_selection")]
    pub node_selection: String,
    pub orderable_fields: Vec<String>,
    #[serde(default)]
    pub default_page_size: Option<u32>,
    #[serde(default)]
    pub arguments: BTreeMap<String, Value>,
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub search_field: Option<String>,
    #[serde(default)]
    pub custom_data_field: Option<String>,
    /// Items whose custom data must read back as supplied
    #[serde(default)]
    pub custom_data: Vec<CustomDataCase>,
}

/// Known item and the custom data it was created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDataCase {
    pub id: String,
    pub expected: Value,
}

fn default_node_selection() -> String {
    "id".to_string()
}

impl ConnectionCase {
    /// Build the connection spec; a missing page size falls back to `default_page_size`
    pub fn to_spec(&self, default_page_size: u32) -> Result<ConnectionQuerySpec> {
        let mut builder = ConnectionQuerySpec::builder(&self.field)
            .node_selection(&self.node_selection)
            .default_page_size(self.default_page_size.unwrap_or(default_page_size));
        for field in &self.orderable_fields {
            builder = builder.orderable(field);
        }
        for (name, value) in &self.arguments {
            builder = builder.fixed_argument(name, ArgValue::from(value));
        }
        if let Some(search_field) = &self.search_field {
            builder = builder.search_field(search_field);
        }
        if let Some(custom_data_field) = &self.custom_data_field {
            builder = builder.custom_data_field(custom_data_field);
        }
        builder.build()
    }
}

/// Single-field mutation description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationCase {
    pub field: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, Value>,
    pub selection: String,
}

impl MutationCase {
    pub fn to_operation(&self) -> Operation {
        let mut field = Field::new(&self.field).select_raw(&self.selection);
        for (name, value) in &self.arguments {
            field.set_arg(name, ArgValue::from(value));
        }
        Operation::mutation(field)
    }
}

/// Delete mutation for the resource an idempotency case created
///
/// Rendered as `field(id: "<captured id>") { selection }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeardownCase {
    pub field: String,
    #[serde(default = "default_teardown_selection")]
    pub selection: String,
}

fn default_teardown_selection() -> String {
    "code".to_string()
}

impl TeardownCase {
    pub fn to_operation(&self, id: &str) -> Operation {
        Operation::delete_by_id(&self.field, id, &self.selection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingKeyCase {
    #[serde(default)]
    pub name: Option<String>,
    pub mutation: MutationCase,
}

/// Idempotency probe against an existing resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyCase {
    pub name: String,
    pub mutation: MutationCase,
    #[serde(default = "default_key_strategy")]
    pub key_strategy: KeyStrategy,
    #[serde(default = "default_first")]
    pub expected_first: ExpectedFirstOutcome,
    #[serde(default = "default_repeat")]
    pub expected_repeat: ExpectedRepeatOutcome,
    #[serde(default)]
    pub resource_id_path: Option<String>,
    #[serde(default)]
    pub domain_rule: Option<DomainCodeRule>,
    /// Also probe a fresh key against the settled resource
    #[serde(default)]
    pub check_new_key: bool,
    /// Deletes the created resource once the case finishes; needs `resource_id_path`
    #[serde(default)]
    pub teardown: Option<TeardownCase>,
}

impl IdempotencyCase {
    pub fn validate(&self) -> Result<()> {
        self.key_strategy.validate().map_err(|e| match e {
            ProbeError::Validation(msg) => {
                ProbeError::validation(format!("idempotency probe '{}': {}", self.name, msg))
            }
            other => other,
        })?;
        if self.teardown.is_some() && self.resource_id_path.is_none() {
            return Err(ProbeError::validation(format!(
                "idempotency probe '{}': teardown needs resource_id_path to capture the id",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_key_strategy() -> KeyStrategy {
    KeyStrategy::Random
}

fn default_first() -> ExpectedFirstOutcome {
    ExpectedFirstOutcome::Success
}

fn default_repeat() -> ExpectedRepeatOutcome {
    ExpectedRepeatOutcome::Rejected
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteFile {
    #[serde(default)]
    pub connections: Vec<ConnectionCase>,
    #[serde(default)]
    pub missing_key_checks: Vec<MissingKeyCase>,
    #[serde(default)]
    pub idempotency_probes: Vec<IdempotencyCase>,
}

impl SuiteFile {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let suite: Self = serde_yaml::from_str(text)?;
        for case in &suite.idempotency_probes {
            case.validate()?;
        }
        Ok(suite)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
            && self.missing_key_checks.is_empty()
            && self.idempotency_probes.is_empty()
    }
}
