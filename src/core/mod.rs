pub mod error;

pub use error::{FailureKind, ProbeError, Result};
