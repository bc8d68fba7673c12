pub mod models;
pub mod services;

pub use models::{CreatedResource, ProbeContext};
pub use services::{ScenarioRunner, TeardownReport};
