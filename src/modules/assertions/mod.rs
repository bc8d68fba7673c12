pub mod checks;
pub mod outcome;
pub mod predicates;

pub use checks::{
    contract_violation, ensure, expect_rejection, expect_shape, expect_success, invariant_violation,
};
pub use outcome::{classify, DomainCodeRule, Outcome};
pub use predicates::{
    contains_case_insensitive, has_data, has_graphql_errors, has_no_graphql_errors, is_array,
    is_non_null, is_number, is_object, is_protocol_rejection, is_transport_success, item_id,
    value_at,
};
