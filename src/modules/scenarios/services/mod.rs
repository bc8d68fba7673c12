pub mod scenario_runner;

pub use scenario_runner::{ScenarioRunner, TeardownReport};
