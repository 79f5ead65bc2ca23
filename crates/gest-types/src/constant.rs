//! Constants and observables: the two specs without optimization semantics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SchemaError;
use crate::longhand::parse_tagged;
use crate::value::json_kind;
use crate::vocs::Category;

/// A fixed input passed unmodified to every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConstantDocument", into = "ConstantDocument")]
pub struct ConstantSpec {
    pub value: Value,
    pub dtype: Option<String>,
}

impl ConstantSpec {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            dtype: None,
        }
    }

    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum ConstantDocument {
    Constant {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
}

impl From<ConstantDocument> for ConstantSpec {
    fn from(doc: ConstantDocument) -> Self {
        let ConstantDocument::Constant { value, dtype } = doc;
        Self { value, dtype }
    }
}

impl From<ConstantSpec> for ConstantDocument {
    fn from(spec: ConstantSpec) -> Self {
        Self::Constant {
            value: spec.value,
            dtype: spec.dtype,
        }
    }
}

/// Everything a constant can be declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantInput {
    /// Raw value; objects must be tagged longhand.
    Value(Value),
    Spec(ConstantSpec),
}

impl From<Value> for ConstantInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ConstantSpec> for ConstantInput {
    fn from(spec: ConstantSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<f64> for ConstantInput {
    fn from(value: f64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for ConstantInput {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for ConstantInput {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for ConstantInput {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for ConstantInput {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

pub fn parse_constant(name: &str, input: ConstantInput) -> Result<ConstantSpec, SchemaError> {
    match input {
        ConstantInput::Spec(spec) => Ok(spec),
        ConstantInput::Value(value @ Value::Object(_)) => {
            parse_tagged(Category::Constant, name, &value, &["Constant"])
        }
        ConstantInput::Value(value) => Ok(ConstantSpec::new(value)),
    }
}

/// An output recorded alongside objectives and constraints but never optimized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ObservableDocument", into = "ObservableDocument")]
pub struct ObservableSpec {
    pub dtype: Option<String>,
}

impl ObservableSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum ObservableDocument {
    Observable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
}

impl From<ObservableDocument> for ObservableSpec {
    fn from(doc: ObservableDocument) -> Self {
        let ObservableDocument::Observable { dtype } = doc;
        Self { dtype }
    }
}

impl From<ObservableSpec> for ObservableDocument {
    fn from(spec: ObservableSpec) -> Self {
        Self::Observable { dtype: spec.dtype }
    }
}

/// Everything an observable can be declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservableInput {
    /// Bare name, no dtype.
    Bare,
    /// Name mapped to a type string.
    DType(String),
    Spec(ObservableSpec),
    Document(Value),
}

impl From<&str> for ObservableInput {
    fn from(dtype: &str) -> Self {
        Self::DType(dtype.to_string())
    }
}

impl From<ObservableSpec> for ObservableInput {
    fn from(spec: ObservableSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Value> for ObservableInput {
    fn from(value: Value) -> Self {
        Self::Document(value)
    }
}

pub fn parse_observable(name: &str, input: ObservableInput) -> Result<ObservableSpec, SchemaError> {
    match input {
        ObservableInput::Bare | ObservableInput::Document(Value::Null) => Ok(ObservableSpec::new()),
        ObservableInput::DType(dtype) | ObservableInput::Document(Value::String(dtype)) => {
            Ok(ObservableSpec::new().with_dtype(dtype))
        }
        ObservableInput::Spec(spec) => Ok(spec),
        ObservableInput::Document(value @ Value::Object(_)) => {
            parse_tagged(Category::Observable, name, &value, &["Observable"])
        }
        ObservableInput::Document(other) => Err(SchemaError::UnsupportedInput {
            category: Category::Observable,
            name: name.to_string(),
            found: json_kind(&other).to_string(),
        }),
    }
}
