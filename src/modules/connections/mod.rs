pub mod models;
pub mod services;

pub use models::{
    ConnectionQuerySpec, ConnectionResult, ConnectionSelection, Edge, OrderBy, OrderDirection,
    PageInfo, PageRequest,
};
pub use services::{ConnectionOracle, CursorSlice, FetchedPage, OrderedScan};
