//! Structural events consumed by the document builder
//!
//! Every input format is reduced to this flat event shape before it reaches
//! the builder. A well-formed stream nests starts and ends correctly and puts
//! a `FieldName` in front of every value that lives inside an object.

use serde_json::{Number, Value};

/// A leaf value carried by an [`Event::Scalar`]
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Scalar {
    /// Name of the scalar kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "boolean",
            Scalar::Null => "null",
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::String(s) => Value::String(s),
            Scalar::Int(i) => Value::Number(i.into()),
            // Non-finite floats have no JSON representation
            Scalar::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Null => Value::Null,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// One structural event of a hierarchical input
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ObjectStart,
    ArrayStart,
    ObjectEnd,
    ArrayEnd,
    FieldName(String),
    Scalar(Scalar),
}

impl Event {
    /// Shorthand for a field-name event
    pub fn field(name: impl Into<String>) -> Self {
        Event::FieldName(name.into())
    }

    /// Shorthand for a scalar event
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Event::Scalar(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::ObjectStart => "object start",
            Event::ArrayStart => "array start",
            Event::ObjectEnd => "object end",
            Event::ArrayEnd => "array end",
            Event::FieldName(_) => "field name",
            Event::Scalar(_) => "scalar",
        }
    }
}
