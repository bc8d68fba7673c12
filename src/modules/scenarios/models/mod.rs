pub mod context;

pub use context::{CreatedResource, ProbeContext};
