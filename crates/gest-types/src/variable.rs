//! Variable specifications and their shorthand forms.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::errors::SchemaError;
use crate::longhand::{check_ordered, parse_tagged};
use crate::value::{json_kind, ParameterValue};
use crate::vocs::Category;

const VARIABLE_TYPES: &[&str] = &["ContinuousVariable", "DiscreteVariable"];

/// A tunable input of the optimization problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VariableSpec {
    /// Real-valued input restricted to `[low, high]`.
    #[serde(rename = "ContinuousVariable")]
    Continuous {
        domain: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<ParameterValue>,
    },
    /// Input drawn from a finite set of scalars.
    #[serde(rename = "DiscreteVariable")]
    Discrete {
        values: Vec<ParameterValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_value: Option<ParameterValue>,
    },
}

impl VariableSpec {
    pub fn continuous(low: f64, high: f64) -> Self {
        Self::Continuous {
            domain: [low, high],
            dtype: None,
            default_value: None,
        }
    }

    pub fn discrete<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        Self::Discrete {
            values: values.into_iter().map(Into::into).collect(),
            dtype: None,
            default_value: None,
        }
    }

    pub fn with_dtype(mut self, new_dtype: impl Into<String>) -> Self {
        match &mut self {
            Self::Continuous { dtype, .. } | Self::Discrete { dtype, .. } => {
                *dtype = Some(new_dtype.into())
            }
        }
        self
    }

    /// Sets the default value. It is checked against the domain or allowed
    /// set when the variable is parsed.
    pub fn with_default(mut self, value: impl Into<ParameterValue>) -> Self {
        match &mut self {
            Self::Continuous { default_value, .. } | Self::Discrete { default_value, .. } => {
                *default_value = Some(value.into())
            }
        }
        self
    }

    pub fn dtype(&self) -> Option<&str> {
        match self {
            Self::Continuous { dtype, .. } | Self::Discrete { dtype, .. } => dtype.as_deref(),
        }
    }

    /// The `[low, high]` domain of a continuous variable.
    pub fn domain(&self) -> Option<[f64; 2]> {
        match self {
            Self::Continuous { domain, .. } => Some(*domain),
            Self::Discrete { .. } => None,
        }
    }

    /// Whether a JSON value lies inside this variable's domain or allowed set.
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Self::Continuous { domain, .. } => value
                .as_f64()
                .is_some_and(|x| domain[0] <= x && x <= domain[1]),
            Self::Discrete { values, .. } => values.iter().any(|v| v.matches_json(value)),
        }
    }

    /// Canonical form: discrete values sorted and deduplicated by value, a
    /// numeric continuous default stored as a float.
    fn canonicalize(self) -> Self {
        match self {
            Self::Continuous {
                domain,
                dtype,
                default_value,
            } => Self::Continuous {
                domain,
                dtype,
                default_value: default_value
                    .map(|d| d.as_f64().map_or(d, ParameterValue::Float)),
            },
            Self::Discrete {
                mut values,
                dtype,
                default_value,
            } => {
                values.sort_by(|a, b| a.canonical_cmp(b));
                values.dedup_by(|later, kept| later.same_value(kept));
                Self::Discrete {
                    values,
                    dtype,
                    default_value,
                }
            }
        }
    }

    fn validate(&self, name: &str) -> Result<(), SchemaError> {
        match self {
            Self::Continuous {
                domain,
                default_value,
                ..
            } => {
                check_ordered(Category::Variable, name, domain[0], domain[1])?;
                if let Some(d) = default_value {
                    let inside = d.as_f64().is_some_and(|x| domain[0] <= x && x <= domain[1]);
                    if !inside {
                        return Err(SchemaError::DefaultOutOfDomain {
                            name: name.to_string(),
                            value: d.to_string(),
                        });
                    }
                }
            }
            Self::Discrete {
                values,
                default_value,
                ..
            } => {
                if values.is_empty() {
                    return Err(SchemaError::EmptyValues {
                        name: name.to_string(),
                    });
                }
                if let Some(d) = default_value {
                    if !values.iter().any(|v| v.same_value(d)) {
                        return Err(SchemaError::DefaultOutOfDomain {
                            name: name.to_string(),
                            value: d.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Everything a variable can be declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableInput {
    /// `[low, high]` list shorthand; must hold exactly two numbers.
    Domain(Vec<f64>),
    /// Set shorthand for a discrete variable.
    Values(Vec<ParameterValue>),
    /// Longhand spec.
    Spec(VariableSpec),
    /// Raw document fragment (list shorthand or tagged object).
    Document(Value),
}

/// Set shorthand for a discrete variable.
pub fn discrete<I, V>(values: I) -> VariableInput
where
    I: IntoIterator<Item = V>,
    V: Into<ParameterValue>,
{
    VariableInput::Values(values.into_iter().map(Into::into).collect())
}

impl From<[f64; 2]> for VariableInput {
    fn from(domain: [f64; 2]) -> Self {
        Self::Domain(domain.to_vec())
    }
}

impl From<(f64, f64)> for VariableInput {
    fn from((low, high): (f64, f64)) -> Self {
        Self::Domain(vec![low, high])
    }
}

impl From<Vec<f64>> for VariableInput {
    fn from(domain: Vec<f64>) -> Self {
        Self::Domain(domain)
    }
}

impl From<BTreeSet<i64>> for VariableInput {
    fn from(values: BTreeSet<i64>) -> Self {
        discrete(values)
    }
}

impl From<BTreeSet<String>> for VariableInput {
    fn from(values: BTreeSet<String>) -> Self {
        discrete(values)
    }
}

impl From<HashSet<String>> for VariableInput {
    fn from(values: HashSet<String>) -> Self {
        discrete(values)
    }
}

impl From<VariableSpec> for VariableInput {
    fn from(spec: VariableSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Value> for VariableInput {
    fn from(value: Value) -> Self {
        Self::Document(value)
    }
}

/// Normalizes any variable input into a validated, canonical spec.
pub fn parse_variable(name: &str, input: VariableInput) -> Result<VariableSpec, SchemaError> {
    let spec = match input {
        VariableInput::Domain(domain) => from_domain(name, &domain)?,
        VariableInput::Values(values) => VariableSpec::Discrete {
            values,
            dtype: None,
            default_value: None,
        },
        VariableInput::Spec(spec) => spec,
        VariableInput::Document(value) => from_document(name, &value)?,
    }
    .canonicalize();

    spec.validate(name)?;
    Ok(spec)
}

fn from_domain(name: &str, domain: &[f64]) -> Result<VariableSpec, SchemaError> {
    match domain {
        [low, high] => Ok(VariableSpec::continuous(*low, *high)),
        _ => Err(SchemaError::Malformed {
            category: Category::Variable,
            name: name.to_string(),
            message: format!(
                "must have two elements representing lower and upper bounds, found {}",
                domain.len()
            ),
        }),
    }
}

fn from_document(name: &str, value: &Value) -> Result<VariableSpec, SchemaError> {
    match value {
        Value::Array(items) => {
            let domain = items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| SchemaError::Malformed {
                    category: Category::Variable,
                    name: name.to_string(),
                    message: "list shorthand must contain only numbers".to_string(),
                })?;
            from_domain(name, &domain)
        }
        Value::Object(_) => parse_tagged(Category::Variable, name, value, VARIABLE_TYPES),
        other => Err(SchemaError::UnsupportedInput {
            category: Category::Variable,
            name: name.to_string(),
            found: json_kind(other).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_shorthand_matches_longhand() {
        let short = parse_variable("x", [0.0, 1.0].into()).unwrap();
        let long = parse_variable("x", VariableSpec::continuous(0.0, 1.0).into()).unwrap();
        let doc = parse_variable("x", json!([0, 1]).into()).unwrap();
        assert_eq!(short, long);
        assert_eq!(short, doc);
    }

    #[test]
    fn set_shorthand_is_order_insensitive() {
        let a = parse_variable("x", discrete(["b", "a", "b"])).unwrap();
        let b = parse_variable("x", VariableSpec::discrete(["a", "b"]).into()).unwrap();
        assert_eq!(a, b);
        match a {
            VariableSpec::Discrete { values, .. } => assert_eq!(values.len(), 2),
            other => panic!("unexpected variable: {other:?}"),
        }
    }

    #[test]
    fn tagged_document_parses() {
        let spec = parse_variable(
            "x",
            json!({"type": "ContinuousVariable", "domain": [-5.0, 5.0], "default_value": 1.0}).into(),
        )
        .unwrap();
        assert_eq!(spec, VariableSpec::continuous(-5.0, 5.0).with_default(1.0));

        let spec = parse_variable(
            "k",
            json!({"type": "DiscreteVariable", "values": [3, 1, 2], "dtype": "int"}).into(),
        )
        .unwrap();
        assert_eq!(spec, VariableSpec::discrete([1, 2, 3]).with_dtype("int"));
    }

    #[test]
    fn unordered_domain_fails() {
        let err = parse_variable("x", [1.0, 0.0].into()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDomain { .. }));
        assert!(parse_variable("x", [1.0, 1.0].into()).is_err());
    }

    #[test]
    fn wrong_arity_fails() {
        let err = parse_variable("x", vec![0.0, 1.0, 2.0].into()).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
        assert!(parse_variable("x", json!([0.0, "a"]).into()).is_err());
    }

    #[test]
    fn empty_set_fails() {
        let err = parse_variable("x", discrete(Vec::<i64>::new())).unwrap_err();
        assert_eq!(err, SchemaError::EmptyValues { name: "x".into() });
    }

    #[test]
    fn default_outside_domain_fails() {
        let err = parse_variable("x", VariableSpec::continuous(0.0, 1.0).with_default(2.0).into())
            .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultOutOfDomain { .. }));

        let err = parse_variable("x", VariableSpec::discrete([1, 2]).with_default(3).into())
            .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultOutOfDomain { .. }));

        assert!(parse_variable("x", VariableSpec::discrete([1, 2]).with_default(2).into()).is_ok());
    }

    #[test]
    fn numeric_members_are_compared_by_value() {
        let spec = parse_variable(
            "x",
            json!({"type": "DiscreteVariable", "values": [1.5, 2.0], "default_value": 2}).into(),
        )
        .unwrap();
        assert!(spec.contains(&json!(2)));

        let spec = parse_variable(
            "x",
            discrete([ParameterValue::Int(1), ParameterValue::Float(1.0), ParameterValue::Int(2)]),
        )
        .unwrap();
        assert_eq!(
            spec,
            VariableSpec::discrete([ParameterValue::Int(1), ParameterValue::Int(2)])
        );
    }

    #[test]
    fn non_numeric_continuous_default_fails() {
        let err = parse_variable("x", VariableSpec::continuous(0.0, 1.0).with_default("oops").into())
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DefaultOutOfDomain {
                name: "x".into(),
                value: "\"oops\"".into()
            }
        );

        let spec = parse_variable(
            "x",
            json!({"type": "ContinuousVariable", "domain": [0, 2], "default_value": 1}).into(),
        )
        .unwrap();
        assert_eq!(spec, VariableSpec::continuous(0.0, 2.0).with_default(1.0));
    }

    #[test]
    fn unknown_tag_and_scalar_fail() {
        let err = parse_variable("x", json!({"type": "IntegerVariable"}).into()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));

        let err = parse_variable("x", json!({"domain": [0, 1]}).into()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingType { .. }));

        let err = parse_variable("x", json!(3.0).into()).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedInput { found, .. } if found == "number"));
    }

    #[test]
    fn contains_checks_domain_and_set() {
        let x = VariableSpec::continuous(0.0, 1.0);
        assert!(x.contains(&json!(0.5)));
        assert!(!x.contains(&json!(1.5)));
        assert!(!x.contains(&json!("a")));

        let k = VariableSpec::discrete(["a", "b"]);
        assert!(k.contains(&json!("a")));
        assert!(!k.contains(&json!("c")));
    }
}
