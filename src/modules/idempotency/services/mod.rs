pub mod idempotency_oracle;

pub use idempotency_oracle::{DomainRejectionReport, IdempotencyOracle};
