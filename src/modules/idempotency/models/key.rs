use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::{ProbeError, Result};

/// Client-supplied deduplication token for a mutating request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wrap an explicit key; it must be usable as an HTTP header value
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ProbeError::validation("idempotency key must not be empty"));
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ProbeError::validation(format!(
                "idempotency key '{}' must be visible ASCII without spaces",
                key.escape_debug()
            )));
        }
        Ok(Self(key))
    }

    /// Random v4 UUID key
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// `<prefix>-<microseconds since epoch>`; the prefix must itself be a valid key
    pub fn timestamped(prefix: &str) -> Result<Self> {
        Self::new(format!("{}-{}", prefix, Utc::now().timestamp_micros()))
    }

    /// Stable key derived from a resource id: first 32 hex chars of SHA-256(id:salt)
    pub fn derived(resource_id: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(resource_id.as_bytes());
        hasher.update(b":");
        hasher.update(salt.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..32].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How keys are minted for successive logical attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum KeyStrategy {
    Random,
    Timestamped { prefix: String },
    Derived { resource_id: String, salt: String },
}

impl KeyStrategy {
    /// Reject strategies whose keys could not travel as a header value
    pub fn validate(&self) -> Result<()> {
        match self {
            KeyStrategy::Timestamped { prefix } => {
                IdempotencyKey::new(prefix.as_str()).map(|_| ())
            }
            KeyStrategy::Random | KeyStrategy::Derived { .. } => Ok(()),
        }
    }

    /// Key for the given attempt number; different attempts never share a key
    pub fn mint(&self, attempt: u32) -> Result<IdempotencyKey> {
        match self {
            KeyStrategy::Random => Ok(IdempotencyKey::random()),
            KeyStrategy::Timestamped { prefix } => {
                IdempotencyKey::timestamped(&format!("{}-{}", prefix, attempt))
            }
            KeyStrategy::Derived { resource_id, salt } => Ok(IdempotencyKey::derived(
                resource_id,
                &format!("{}:{}", salt, attempt),
            )),
        }
    }
}
