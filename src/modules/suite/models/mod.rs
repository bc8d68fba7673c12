pub mod suite_file;

pub use suite_file::{
    ConnectionCase, CustomDataCase, IdempotencyCase, MissingKeyCase, MutationCase, SuiteFile,
    TeardownCase,
};
