// Description of a Relay-style connection field under test
//
// `ConnectionQuerySpec` says which list field to ask for and how; `PageRequest`
// carries the paging arguments of one request. Both render through the typed
// query builder.

use serde::{Deserialize, Serialize};

use crate::core::{ProbeError, Result};
use crate::modules::graphql::{ArgValue, Field, Operation};

/// Sort direction of an `orderBy` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn token(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }
}

impl std::fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Complete `orderBy` value; both members are mandatory on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub direction: OrderDirection,
    pub field: String,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            direction,
            field: field.into(),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Desc)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.field.clone(), self.direction.reversed())
    }

    pub fn to_arg(&self) -> ArgValue {
        ArgValue::object([
            ("direction", ArgValue::enum_token(self.direction.token())),
            ("field", ArgValue::enum_token(self.field.clone())),
        ])
    }
}

/// Paging arguments of a single connection request
///
/// Arguments are kept as raw literals so that malformed values (negative
/// sizes, wrong types, partial `orderBy`) can be sent on purpose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub order_by: Option<ArgValue>,
    pub first: Option<ArgValue>,
    pub last: Option<ArgValue>,
    pub before: Option<ArgValue>,
    pub after: Option<ArgValue>,
    pub search: Option<ArgValue>,
}

impl PageRequest {
    /// Request without any `orderBy`
    pub fn unordered() -> Self {
        Self::default()
    }

    pub fn ordered(order: &OrderBy) -> Self {
        Self {
            order_by: Some(order.to_arg()),
            ..Default::default()
        }
    }

    /// `orderBy` with only the `direction` member
    pub fn direction_only(direction: OrderDirection) -> Self {
        Self {
            order_by: Some(ArgValue::object([(
                "direction",
                ArgValue::enum_token(direction.token()),
            )])),
            ..Default::default()
        }
    }

    /// `orderBy` with only the `field` member
    pub fn field_only(field: &str) -> Self {
        Self {
            order_by: Some(ArgValue::object([("field", ArgValue::enum_token(field))])),
            ..Default::default()
        }
    }

    pub fn first(mut self, n: u32) -> Self {
        self.first = Some(ArgValue::from(n));
        self
    }

    pub fn last(mut self, n: u32) -> Self {
        self.last = Some(ArgValue::from(n));
        self
    }

    pub fn first_raw(mut self, value: ArgValue) -> Self {
        self.first = Some(value);
        self
    }

    pub fn last_raw(mut self, value: ArgValue) -> Self {
        self.last = Some(value);
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(ArgValue::String(cursor.into()));
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(ArgValue::String(cursor.into()));
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(ArgValue::String(term.into()));
        self
    }

    fn apply(&self, field: &mut Field) {
        let args = [
            ("orderBy", &self.order_by),
            ("first", &self.first),
            ("last", &self.last),
            ("before", &self.before),
            ("after", &self.after),
            ("searchString", &self.search),
        ];
        for (name, value) in args {
            if let Some(value) = value {
                field.set_arg(name, value.clone());
            }
        }
    }
}

/// Which members of the connection to select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSelection {
    /// `edges`, `nodes`, `pageInfo` and `totalCount`
    Full,
    /// `totalCount` only
    TotalCount,
}

/// Immutable description of the connection field under test
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionQuerySpec {
    /// GraphQL list field, e.g. `discounts`
    pub field_name: String,
    /// Selection set text applied to every node; must select `id`
    pub node_selection: String,
    /// Enum tokens accepted by `orderBy.field`; the first one is the default order
    pub orderable_fields: Vec<String>,
    /// Page size the server applies when neither `first` nor `last` is given
    pub default_page_size: u32,
    /// Arguments sent with every request (e.g. an owning merchant id)
    pub fixed_arguments: Vec<(String, ArgValue)>,
    /// Node field (dotted path) that `searchString` must match
    pub search_field: String,
    /// Node field carrying opaque client data
    pub custom_data_field: String,
}

impl ConnectionQuerySpec {
    pub fn builder(field_name: impl Into<String>) -> ConnectionQuerySpecBuilder {
        ConnectionQuerySpecBuilder::new(field_name)
    }

    /// Ascending order on the first orderable field
    pub fn default_order(&self) -> OrderBy {
        OrderBy::asc(self.orderable_fields.first().cloned().unwrap_or_default())
    }

    pub fn field(&self, request: &PageRequest, selection: ConnectionSelection) -> Field {
        let mut field = Field::new(&self.field_name);
        for (name, value) in &self.fixed_arguments {
            field.set_arg(name.clone(), value.clone());
        }
        request.apply(&mut field);

        match selection {
            ConnectionSelection::TotalCount => field.select_all(["totalCount"]),
            ConnectionSelection::Full => field
                .select(
                    Field::new("edges")
                        .select_all(["cursor"])
                        .select(Field::new("node").select_raw(&self.node_selection)),
                )
                .select(Field::new("nodes").select_raw(&self.node_selection))
                .select(Field::new("pageInfo").select_all([
                    "startCursor",
                    "endCursor",
                    "hasNextPage",
                    "hasPreviousPage",
                ]))
                .select_all(["totalCount"]),
        }
    }

    pub fn operation(&self, request: &PageRequest, selection: ConnectionSelection) -> Operation {
        Operation::query(self.field(request, selection))
    }
}

/// Validating builder for `ConnectionQuerySpec`
#[derive(Debug, Clone)]
pub struct ConnectionQuerySpecBuilder {
    spec: ConnectionQuerySpec,
}

impl ConnectionQuerySpecBuilder {
    fn new(field_name: impl Into<String>) -> Self {
        Self {
            spec: ConnectionQuerySpec {
                field_name: field_name.into(),
                node_selection: "id".to_string(),
                orderable_fields: Vec::new(),
                default_page_size: 25,
                fixed_arguments: Vec::new(),
                search_field: "name".to_string(),
                custom_data_field: "customData".to_string(),
            },
        }
    }

    pub fn node_selection(mut self, selection: impl Into<String>) -> Self {
        self.spec.node_selection = selection.into();
        self
    }

    /// Add an orderable field; duplicates are ignored
    pub fn orderable(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.spec.orderable_fields.contains(&field) {
            self.spec.orderable_fields.push(field);
        }
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.spec.default_page_size = size;
        self
    }

    pub fn fixed_argument(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.spec.fixed_arguments.push((name.into(), value.into()));
        self
    }

    pub fn search_field(mut self, field: impl Into<String>) -> Self {
        self.spec.search_field = field.into();
        self
    }

    pub fn custom_data_field(mut self, field: impl Into<String>) -> Self {
        self.spec.custom_data_field = field.into();
        self
    }

    pub fn build(self) -> Result<ConnectionQuerySpec> {
        let spec = self.spec;
        if spec.field_name.trim().is_empty() {
            return Err(ProbeError::validation("connection field name must not be empty"));
        }
        if !spec.node_selection.split_whitespace().any(|token| token == "id") {
            return Err(ProbeError::validation(format!(
                "node selection for '{}' must select 'id'",
                spec.field_name
            )));
        }
        if spec.orderable_fields.is_empty() {
            return Err(ProbeError::validation(format!(
                "connection '{}' needs at least one orderable field",
                spec.field_name
            )));
        }
        if spec.default_page_size == 0 {
            return Err(ProbeError::validation("default page size must be greater than 0"));
        }
        Ok(spec)
    }
}
