//! Point and scalar value types shared by the schema and by generators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Reserved field carrying a generator-issued identifier.
pub const ID_FIELD: &str = "_id";

/// A mapping from field name to value, as exchanged through `suggest`/`ingest`.
pub type Point = HashMap<String, Value>;

/// A scalar that can appear in a discrete variable's allowed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    /// Converts a JSON scalar; arrays, objects and null are rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Total order used to canonicalize discrete value sets: booleans, then
    /// numbers, then strings.
    pub(crate) fn canonical_cmp(&self, other: &Self) -> Ordering {
        fn rank(v: &ParameterValue) -> u8 {
            match v {
                ParameterValue::Bool(_) => 0,
                ParameterValue::Int(_) | ParameterValue::Float(_) => 1,
                ParameterValue::Text(_) => 2,
            }
        }

        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) if rank(a) == 1 && rank(b) == 1 => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y)
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }

    /// Value equality used for set membership: integers and floats with the
    /// same numeric value are the same member.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => matches!((self.as_f64(), other.as_f64()), (Some(x), Some(y)) if x == y),
        }
    }

    /// Whether a JSON value stands for this scalar, under [`Self::same_value`].
    pub fn matches_json(&self, value: &Value) -> bool {
        Self::from_json(value).is_some_and(|v| self.same_value(&v))
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Short description of a JSON value's shape, used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(ParameterValue::from_json(&json!(3)), Some(ParameterValue::Int(3)));
        assert_eq!(ParameterValue::from_json(&json!(0.5)), Some(ParameterValue::Float(0.5)));
        assert_eq!(ParameterValue::from_json(&json!("a")), Some(ParameterValue::from("a")));
        assert_eq!(ParameterValue::from_json(&json!(true)), Some(ParameterValue::Bool(true)));
        assert_eq!(ParameterValue::from_json(&json!([1])), None);
        assert_eq!(ParameterValue::from_json(&Value::Null), None);
    }

    #[test]
    fn canonical_order_groups_by_kind() {
        let mut values = vec![
            ParameterValue::from("b"),
            ParameterValue::Float(2.5),
            ParameterValue::Bool(true),
            ParameterValue::Int(1),
            ParameterValue::from("a"),
        ];
        values.sort_by(|a, b| a.canonical_cmp(b));
        assert_eq!(
            values,
            vec![
                ParameterValue::Bool(true),
                ParameterValue::Int(1),
                ParameterValue::Float(2.5),
                ParameterValue::from("a"),
                ParameterValue::from("b"),
            ]
        );
    }

    #[test]
    fn numeric_match_ignores_representation() {
        assert!(ParameterValue::Int(2).matches_json(&json!(2.0)));
        assert!(ParameterValue::Float(2.0).matches_json(&json!(2)));
        assert!(!ParameterValue::from("2").matches_json(&json!(2)));
    }

    #[test]
    fn numeric_members_compare_by_value() {
        assert!(ParameterValue::Int(1).same_value(&ParameterValue::Float(1.0)));
        assert!(!ParameterValue::Int(1).same_value(&ParameterValue::Float(1.5)));
        assert!(!ParameterValue::Bool(true).same_value(&ParameterValue::Int(1)));
        assert_eq!(
            ParameterValue::Int(1).canonical_cmp(&ParameterValue::Float(1.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn untagged_deserialization_prefers_integers() {
        let values: Vec<ParameterValue> = serde_json::from_value(json!([1, 1.5, "x", false])).unwrap();
        assert_eq!(
            values,
            vec![
                ParameterValue::Int(1),
                ParameterValue::Float(1.5),
                ParameterValue::from("x"),
                ParameterValue::Bool(false),
            ]
        );
    }
}
