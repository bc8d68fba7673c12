pub mod suite_driver;

pub use suite_driver::{CaseReport, SuiteDriver, SuiteReport};
