pub mod query;
pub mod response;

pub use query::{ArgValue, Field, Operation, OperationKind, Selection};
pub use response::{GraphqlBody, GraphqlResponse, Headers};
