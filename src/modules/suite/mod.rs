pub mod models;
pub mod services;

pub use models::{
    ConnectionCase, CustomDataCase, IdempotencyCase, MissingKeyCase, MutationCase, SuiteFile,
    TeardownCase,
};
pub use services::{CaseReport, SuiteDriver, SuiteReport};
