pub mod models;
pub mod services;

pub use models::{
    ArgValue, Field, GraphqlBody, GraphqlResponse, Headers, Operation, OperationKind, Selection,
};
pub use services::{GraphqlClient, GraphqlTransport, PollDecision, Poller};
