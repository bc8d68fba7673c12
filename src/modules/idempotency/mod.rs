pub mod models;
pub mod services;

pub use models::{
    ExpectedFirstOutcome, ExpectedRepeatOutcome, IdempotencyKey, IdempotencyProbe, KeyStrategy,
    ProbeEvent, ProbeState,
};
pub use services::{DomainRejectionReport, IdempotencyOracle};
