// Per-scenario probe context
//
// Created fresh for every scenario and threaded through setup, action and
// teardown. Clones share the same registry, so resources registered from
// inside a scenario body are visible to the teardown that follows it.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::Result;
use crate::modules::graphql::Operation;
use crate::modules::idempotency::{IdempotencyKey, KeyStrategy};

/// Remote resource created by a scenario, with the mutation that deletes it
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedResource {
    pub id: String,
    pub delete: Operation,
}

#[derive(Debug, Default)]
struct Registry {
    resources: Vec<CreatedResource>,
    attempts: u32,
}

#[derive(Debug, Clone)]
pub struct ProbeContext {
    scenario: String,
    namespace: String,
    registry: Arc<Mutex<Registry>>,
}

impl ProbeContext {
    /// Context whose namespace is `<prefix>-<8 hex chars>`
    pub fn new(scenario: impl Into<String>, prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            scenario: scenario.into(),
            namespace: format!("{}-{}", prefix, &suffix[..8]),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespaced name for data created by this scenario
    pub fn name(&self, base: &str) -> String {
        format!("{}-{}", self.namespace, base)
    }

    /// Record a created resource for teardown
    pub fn register(&self, id: impl Into<String>, delete: Operation) {
        self.registry.lock().resources.push(CreatedResource {
            id: id.into(),
            delete,
        });
    }

    pub fn created(&self) -> Vec<CreatedResource> {
        self.registry.lock().resources.clone()
    }

    /// Remove and return every registered resource, oldest first
    pub fn take_created(&self) -> Vec<CreatedResource> {
        std::mem::take(&mut self.registry.lock().resources)
    }

    /// Fresh key for the next logical attempt of this scenario
    pub fn mint_key(&self, strategy: &KeyStrategy) -> Result<IdempotencyKey> {
        let attempt = {
            let mut registry = self.registry.lock();
            let attempt = registry.attempts;
            registry.attempts += 1;
            attempt
        };
        strategy.mint(attempt)
    }
}
