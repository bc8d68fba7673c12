pub mod client;
pub mod poller;
pub mod transport;

pub use client::GraphqlClient;
pub use poller::{PollDecision, Poller};
pub use transport::GraphqlTransport;
