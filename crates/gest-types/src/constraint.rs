//! Constraint specifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::errors::SchemaError;
use crate::longhand::{check_ordered, parse_tagged};
use crate::value::json_kind;
use crate::vocs::Category;

const CONSTRAINT_TYPES: &[&str] = &[
    "LessThanConstraint",
    "GreaterThanConstraint",
    "BoundsConstraint",
];

/// The shorthand kind strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    LessThan,
    GreaterThan,
    Bounds,
}

impl FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LESS_THAN" => Ok(Self::LessThan),
            "GREATER_THAN" => Ok(Self::GreaterThan),
            "BOUNDS" => Ok(Self::Bounds),
            _ => Err(s.to_ascii_uppercase()),
        }
    }
}

/// A feasibility condition on an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConstraintSpec {
    #[serde(rename = "LessThanConstraint")]
    LessThan {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
    #[serde(rename = "GreaterThanConstraint")]
    GreaterThan {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
    #[serde(rename = "BoundsConstraint")]
    Bounds {
        range: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
}

impl ConstraintSpec {
    pub fn less_than(value: f64) -> Self {
        Self::LessThan { value, dtype: None }
    }

    pub fn greater_than(value: f64) -> Self {
        Self::GreaterThan { value, dtype: None }
    }

    pub fn bounds(low: f64, high: f64) -> Self {
        Self::Bounds {
            range: [low, high],
            dtype: None,
        }
    }

    pub fn with_dtype(mut self, new_dtype: impl Into<String>) -> Self {
        match &mut self {
            Self::LessThan { dtype, .. }
            | Self::GreaterThan { dtype, .. }
            | Self::Bounds { dtype, .. } => *dtype = Some(new_dtype.into()),
        }
        self
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::LessThan { .. } => ConstraintKind::LessThan,
            Self::GreaterThan { .. } => ConstraintKind::GreaterThan,
            Self::Bounds { .. } => ConstraintKind::Bounds,
        }
    }

    pub fn dtype(&self) -> Option<&str> {
        match self {
            Self::LessThan { dtype, .. }
            | Self::GreaterThan { dtype, .. }
            | Self::Bounds { dtype, .. } => dtype.as_deref(),
        }
    }

    /// Whether `x` satisfies the constraint. Bounds are closed on both ends.
    pub fn check(&self, x: f64) -> bool {
        match self {
            Self::LessThan { value, .. } => x < *value,
            Self::GreaterThan { value, .. } => x > *value,
            Self::Bounds { range, .. } => range[0] <= x && x <= range[1],
        }
    }

    fn validate(&self, name: &str) -> Result<(), SchemaError> {
        match self {
            Self::Bounds { range, .. } => check_ordered(Category::Constraint, name, range[0], range[1]),
            Self::LessThan { value, .. } | Self::GreaterThan { value, .. } if !value.is_finite() => {
                Err(SchemaError::Malformed {
                    category: Category::Constraint,
                    name: name.to_string(),
                    message: format!("threshold {value} is not finite"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Everything a constraint can be declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintInput {
    /// `[kind, payload...]` shorthand; one number for LESS_THAN/GREATER_THAN,
    /// two for BOUNDS.
    Shorthand { kind: String, payload: Vec<f64> },
    Spec(ConstraintSpec),
    Document(Value),
}

impl From<(&str, f64)> for ConstraintInput {
    fn from((kind, threshold): (&str, f64)) -> Self {
        Self::Shorthand {
            kind: kind.to_string(),
            payload: vec![threshold],
        }
    }
}

impl From<(&str, [f64; 2])> for ConstraintInput {
    fn from((kind, range): (&str, [f64; 2])) -> Self {
        Self::Shorthand {
            kind: kind.to_string(),
            payload: range.to_vec(),
        }
    }
}

impl From<ConstraintSpec> for ConstraintInput {
    fn from(spec: ConstraintSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Value> for ConstraintInput {
    fn from(value: Value) -> Self {
        Self::Document(value)
    }
}

/// Normalizes any constraint input into a validated longhand spec.
pub fn parse_constraint(name: &str, input: ConstraintInput) -> Result<ConstraintSpec, SchemaError> {
    let spec = match input {
        ConstraintInput::Shorthand { kind, payload } => from_shorthand(name, &kind, &payload)?,
        ConstraintInput::Spec(spec) => spec,
        ConstraintInput::Document(value) => from_document(name, &value)?,
    };

    spec.validate(name)?;
    Ok(spec)
}

fn malformed(name: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::Malformed {
        category: Category::Constraint,
        name: name.to_string(),
        message: message.into(),
    }
}

fn from_shorthand(name: &str, kind: &str, payload: &[f64]) -> Result<ConstraintSpec, SchemaError> {
    let kind = kind
        .parse::<ConstraintKind>()
        .map_err(|kind| SchemaError::UnknownConstraintKind {
            name: name.to_string(),
            kind,
        })?;

    match (kind, payload) {
        (ConstraintKind::LessThan, [value]) => Ok(ConstraintSpec::less_than(*value)),
        (ConstraintKind::GreaterThan, [value]) => Ok(ConstraintSpec::greater_than(*value)),
        (ConstraintKind::Bounds, [low, high]) => Ok(ConstraintSpec::bounds(*low, *high)),
        (ConstraintKind::Bounds, _) => Err(malformed(
            name,
            format!("BOUNDS needs a [low, high] pair, found {} values", payload.len()),
        )),
        (_, _) => Err(malformed(
            name,
            format!("threshold constraints need one value, found {}", payload.len()),
        )),
    }
}

fn from_document(name: &str, value: &Value) -> Result<ConstraintSpec, SchemaError> {
    match value {
        Value::Array(items) => {
            let (kind, rest) = match items.split_first() {
                Some((Value::String(kind), rest)) => (kind, rest),
                Some((other, _)) => {
                    return Err(malformed(
                        name,
                        format!("constraint type {other} must be a string if specified by a list"),
                    ))
                }
                None => return Err(malformed(name, "empty list")),
            };

            // Accept both ["BOUNDS", lo, hi] and ["BOUNDS", [lo, hi]].
            let flattened: Vec<&Value> = match rest {
                [Value::Array(pair)] => pair.iter().collect(),
                _ => rest.iter().collect(),
            };
            let payload = flattened
                .into_iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| malformed(name, "constraint payload must be numeric"))?;

            from_shorthand(name, kind, &payload)
        }
        Value::Object(_) => parse_tagged(Category::Constraint, name, value, CONSTRAINT_TYPES),
        other => Err(SchemaError::UnsupportedInput {
            category: Category::Constraint,
            name: name.to_string(),
            found: json_kind(other).to_string(),
        }),
    }
}
