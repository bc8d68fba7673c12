//! gqlprobe
//!
//! Black-box conformance oracles for GraphQL APIs: Relay-style connection
//! pagination, idempotency-key handling on mutations, and the assertion
//! primitives both are built from.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use crate::core::{FailureKind, ProbeError, Result};
pub use modules::assertions;
pub use modules::connections;
pub use modules::graphql;
pub use modules::idempotency;
pub use modules::scenarios;
pub use modules::suite;
