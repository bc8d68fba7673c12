pub mod key;
pub mod probe;

pub use key::{IdempotencyKey, KeyStrategy};
pub use probe::{
    ExpectedFirstOutcome, ExpectedRepeatOutcome, IdempotencyProbe, ProbeEvent, ProbeState,
};
