pub mod connection_oracle;

pub use connection_oracle::{ConnectionOracle, CursorSlice, FetchedPage, OrderedScan};
