//! Objective specifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::errors::SchemaError;
use crate::longhand::parse_tagged;
use crate::value::json_kind;
use crate::vocs::Category;

const OBJECTIVE_TYPES: &[&str] = &["MinimizeObjective", "MaximizeObjective", "ExploreObjective"];

/// Whether an objective is minimized, maximized or only explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveDirection {
    Minimize,
    Maximize,
    Explore,
}

impl ObjectiveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimize => "MINIMIZE",
            Self::Maximize => "MAXIMIZE",
            Self::Explore => "EXPLORE",
        }
    }

    /// Whether `candidate` is strictly better than `incumbent` in this direction.
    /// Exploration has no notion of better.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
            Self::Explore => false,
        }
    }
}

impl FromStr for ObjectiveDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MINIMIZE" => Ok(Self::Minimize),
            "MAXIMIZE" => Ok(Self::Maximize),
            "EXPLORE" => Ok(Self::Explore),
            _ => Err(s.to_string()),
        }
    }
}

impl std::fmt::Display for ObjectiveDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optimization target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ObjectiveDocument", into = "ObjectiveDocument")]
pub struct ObjectiveSpec {
    pub direction: ObjectiveDirection,
    pub dtype: Option<String>,
}

impl ObjectiveSpec {
    pub fn new(direction: ObjectiveDirection) -> Self {
        Self {
            direction,
            dtype: None,
        }
    }

    pub fn minimize() -> Self {
        Self::new(ObjectiveDirection::Minimize)
    }

    pub fn maximize() -> Self {
        Self::new(ObjectiveDirection::Maximize)
    }

    pub fn explore() -> Self {
        Self::new(ObjectiveDirection::Explore)
    }

    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }
}

/// Longhand document layout: one tag per direction.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum ObjectiveDocument {
    MinimizeObjective {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
    MaximizeObjective {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
    ExploreObjective {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
    },
}

impl From<ObjectiveDocument> for ObjectiveSpec {
    fn from(doc: ObjectiveDocument) -> Self {
        let (direction, dtype) = match doc {
            ObjectiveDocument::MinimizeObjective { dtype } => (ObjectiveDirection::Minimize, dtype),
            ObjectiveDocument::MaximizeObjective { dtype } => (ObjectiveDirection::Maximize, dtype),
            ObjectiveDocument::ExploreObjective { dtype } => (ObjectiveDirection::Explore, dtype),
        };
        Self { direction, dtype }
    }
}

impl From<ObjectiveSpec> for ObjectiveDocument {
    fn from(spec: ObjectiveSpec) -> Self {
        let dtype = spec.dtype;
        match spec.direction {
            ObjectiveDirection::Minimize => Self::MinimizeObjective { dtype },
            ObjectiveDirection::Maximize => Self::MaximizeObjective { dtype },
            ObjectiveDirection::Explore => Self::ExploreObjective { dtype },
        }
    }
}

/// Everything an objective can be declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveInput {
    /// Direction string shorthand (`"MINIMIZE"`, `"maximize"`, ...).
    Direction(String),
    Spec(ObjectiveSpec),
    Document(Value),
}

impl From<&str> for ObjectiveInput {
    fn from(direction: &str) -> Self {
        Self::Direction(direction.to_string())
    }
}

impl From<String> for ObjectiveInput {
    fn from(direction: String) -> Self {
        Self::Direction(direction)
    }
}

impl From<ObjectiveDirection> for ObjectiveInput {
    fn from(direction: ObjectiveDirection) -> Self {
        Self::Spec(ObjectiveSpec::new(direction))
    }
}

impl From<ObjectiveSpec> for ObjectiveInput {
    fn from(spec: ObjectiveSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Value> for ObjectiveInput {
    fn from(value: Value) -> Self {
        Self::Document(value)
    }
}

/// Normalizes any objective input into its longhand spec.
pub fn parse_objective(name: &str, input: ObjectiveInput) -> Result<ObjectiveSpec, SchemaError> {
    match input {
        ObjectiveInput::Direction(direction) => from_direction(name, &direction),
        ObjectiveInput::Spec(spec) => Ok(spec),
        ObjectiveInput::Document(Value::String(direction)) => from_direction(name, &direction),
        ObjectiveInput::Document(value @ Value::Object(_)) => {
            parse_tagged(Category::Objective, name, &value, OBJECTIVE_TYPES)
        }
        ObjectiveInput::Document(other) => Err(SchemaError::UnsupportedInput {
            category: Category::Objective,
            name: name.to_string(),
            found: json_kind(&other).to_string(),
        }),
    }
}

fn from_direction(name: &str, direction: &str) -> Result<ObjectiveSpec, SchemaError> {
    direction
        .parse::<ObjectiveDirection>()
        .map(ObjectiveSpec::new)
        .map_err(|direction| SchemaError::UnknownObjective {
            name: name.to_string(),
            direction,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_shorthand_is_case_insensitive() {
        assert_eq!(parse_objective("f", "MINIMIZE".into()).unwrap(), ObjectiveSpec::minimize());
        assert_eq!(parse_objective("f", "maximize".into()).unwrap(), ObjectiveSpec::maximize());
        assert_eq!(parse_objective("f", json!("Explore").into()).unwrap(), ObjectiveSpec::explore());
    }

    #[test]
    fn unknown_direction_fails() {
        let err = parse_objective("f", "SOMETIMES".into()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownObjective {
                name: "f".into(),
                direction: "SOMETIMES".into()
            }
        );
    }

    #[test]
    fn tagged_document_round_trip() {
        let spec = ObjectiveSpec::maximize().with_dtype("float");
        let doc = serde_json::to_value(&spec).unwrap();
        assert_eq!(doc, json!({"type": "MaximizeObjective", "dtype": "float"}));
        assert_eq!(parse_objective("f", doc.into()).unwrap(), spec);
    }

    #[test]
    fn non_objective_tag_fails() {
        let err = parse_objective("f", json!({"type": "Constant"}).into()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
        assert!(parse_objective("f", json!(1).into()).is_err());
    }

    #[test]
    fn improvement_follows_direction() {
        assert!(ObjectiveDirection::Minimize.improves(1.0, 2.0));
        assert!(ObjectiveDirection::Maximize.improves(2.0, 1.0));
        assert!(!ObjectiveDirection::Explore.improves(2.0, 1.0));
    }
}
