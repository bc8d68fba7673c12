use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Per-request header map (name -> value)
pub type Headers = BTreeMap<String, String>;

/// Decoded GraphQL response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlBody {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

/// Single HTTP exchange as seen by the oracles
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Decoded body; both members are `None` when the body was not GraphQL JSON
    pub body: GraphqlBody,

    /// Raw response text, kept for failure reports
    pub raw: String,
}

impl GraphqlResponse {
    /// Build a response from raw body text; undecodable text yields an empty body
    pub fn from_raw(status_code: u16, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let body = serde_json::from_str::<GraphqlBody>(&raw).unwrap_or_default();
        Self {
            status_code,
            body,
            raw,
        }
    }

    /// Build a response from a JSON body, e.g. from an in-memory transport
    pub fn from_json(status_code: u16, body: Value) -> Self {
        let raw = body.to_string();
        Self::from_raw(status_code, raw)
    }

    /// Whether the HTTP status is 2xx
    pub fn status_ok(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// `data` when present and not `null`
    pub fn data(&self) -> Option<&Value> {
        self.body.data.as_ref().filter(|d| !d.is_null())
    }

    /// `errors` when present and non-empty
    pub fn errors(&self) -> Option<&[Value]> {
        self.body.errors.as_deref().filter(|e| !e.is_empty())
    }

    /// First error message, if any
    pub fn first_error_message(&self) -> Option<&str> {
        self.errors()
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    }
}

impl fmt::Display for GraphqlResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.raw)
    }
}
