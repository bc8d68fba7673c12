pub mod assertions;
pub mod connections;
pub mod graphql;
pub mod idempotency;
pub mod scenarios;
pub mod suite;
