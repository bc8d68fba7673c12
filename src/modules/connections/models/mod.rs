pub mod connection_result;
pub mod connection_spec;

pub use connection_result::{parse_total_count, ConnectionResult, Edge, PageInfo};
pub use connection_spec::{
    ConnectionQuerySpec, ConnectionQuerySpecBuilder, ConnectionSelection, OrderBy, OrderDirection,
    PageRequest,
};
