// Typed GraphQL document builder
//
// A small AST of operations, fields, arguments and selection sets, rendered
// to GraphQL text by a single `Display` implementation. Every request the
// oracles send is built through this module.

use serde_json::Value;
use std::fmt;

/// Operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Argument value literal
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Bare enum token, rendered without quotes (e.g. `ASC`)
    Enum(String),
    List(Vec<ArgValue>),
    /// Input object; field order is preserved
    Object(Vec<(String, ArgValue)>),
}

impl ArgValue {
    pub fn enum_token(token: impl Into<String>) -> Self {
        ArgValue::Enum(token.into())
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, ArgValue)>) -> Self {
        ArgValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(i64::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<&Value> for ArgValue {
    /// JSON objects become input objects; JSON strings stay quoted strings
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ArgValue::Int(i),
                None => ArgValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ArgValue::String(s.clone()),
            Value::Array(items) => ArgValue::List(items.iter().map(ArgValue::from).collect()),
            Value::Object(map) => ArgValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), ArgValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => write!(f, "null"),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::String(s) => write_escaped(f, s),
            ArgValue::Enum(token) => write!(f, "{}", token),
            ArgValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ArgValue::Object(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Entry of a selection set
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    /// Verbatim selection text, e.g. a reusable node fragment
    Raw(String),
}

/// Field with optional alias, arguments and sub-selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<(String, ArgValue)>,
    pub selection: Vec<Selection>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add an argument, replacing an existing one with the same name
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.set_arg(name, value);
        self
    }

    pub fn set_arg(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        let name = name.into();
        let value = value.into();
        match self.arguments.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.arguments.push((name, value)),
        }
    }

    pub fn remove_arg(&mut self, name: &str) {
        self.arguments.retain(|(n, _)| n != name);
    }

    pub fn select(mut self, field: Field) -> Self {
        self.selection.push(Selection::Field(field));
        self
    }

    /// Add leaf fields by name
    pub fn select_all<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.selection
            .extend(names.into_iter().map(|n| Selection::Field(Field::new(n))));
        self
    }

    pub fn select_raw(mut self, text: impl Into<String>) -> Self {
        self.selection.push(Selection::Raw(text.into()));
        self
    }

    /// Key under which the field appears in the response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{}: ", alias)?;
        }
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "(")?;
            for (i, (name, value)) in self.arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", name, value)?;
            }
            write!(f, ")")?;
        }
        if !self.selection.is_empty() {
            write!(f, " ")?;
            write_selection(f, &self.selection)?;
        }
        Ok(())
    }
}

fn write_selection(f: &mut fmt::Formatter<'_>, selection: &[Selection]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, entry) in selection.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        match entry {
            Selection::Field(field) => write!(f, "{}", field)?,
            Selection::Raw(text) => write!(f, "{}", text.trim())?,
        }
    }
    write!(f, "}}")
}

/// Complete GraphQL operation
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub fields: Vec<Field>,
}

impl Operation {
    pub fn query(field: Field) -> Self {
        Self {
            kind: OperationKind::Query,
            fields: vec![field],
        }
    }

    pub fn mutation(field: Field) -> Self {
        Self {
            kind: OperationKind::Mutation,
            fields: vec![field],
        }
    }

    /// Mutation `field(id: "<id>") { <selection> }`, the usual shape of a delete
    pub fn delete_by_id(field: impl Into<String>, id: impl Into<String>, selection: &str) -> Self {
        Self::mutation(Field::new(field).arg("id", id.into()).select_raw(selection))
    }

    /// First root field; operations built by this crate always have one
    pub fn root(&self) -> Option<&Field> {
        self.fields.first()
    }

    pub fn root_mut(&mut self) -> Option<&mut Field> {
        self.fields.first_mut()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == OperationKind::Mutation {
            write!(f, "mutation ")?;
        }
        let selection: Vec<Selection> = self.fields.iter().cloned().map(Selection::Field).collect();
        write_selection(f, &selection)
    }
}
