//! Shared parsing of tagged longhand objects (`{"type": "...", ...}`).

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::SchemaError;
use crate::vocs::Category;

pub(crate) const TYPE_FIELD: &str = "type";

/// Reads the `type` tag of a longhand object, checks it against the tags the
/// category knows, and deserializes the full object.
pub(crate) fn parse_tagged<T: DeserializeOwned>(
    category: Category,
    name: &str,
    value: &Value,
    known: &[&str],
) -> Result<T, SchemaError> {
    let type_name = match value.get(TYPE_FIELD) {
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            return Err(SchemaError::Malformed {
                category,
                name: name.to_string(),
                message: format!("type field must be a string, found {other}"),
            })
        }
        None => {
            return Err(SchemaError::MissingType {
                category,
                name: name.to_string(),
            })
        }
    };

    if !known.contains(&type_name) {
        return Err(SchemaError::UnknownType {
            category,
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
    }

    serde_json::from_value(value.clone()).map_err(|e| SchemaError::Malformed {
        category,
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Rejects a non-finite or unordered `[low, high]` pair, and one whose width
/// overflows `f64`.
pub(crate) fn check_ordered(
    category: Category,
    name: &str,
    low: f64,
    high: f64,
) -> Result<(), SchemaError> {
    if low < high && (high - low).is_finite() {
        Ok(())
    } else {
        Err(SchemaError::InvalidDomain {
            category,
            name: name.to_string(),
            low,
            high,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum Probe {
        Known { value: f64 },
    }

    #[test]
    fn missing_and_unknown_tags_are_reported() {
        let missing = parse_tagged::<Probe>(Category::Constant, "k", &json!({"value": 1}), &["Known"]);
        assert!(matches!(missing, Err(SchemaError::MissingType { .. })));

        let unknown =
            parse_tagged::<Probe>(Category::Constant, "k", &json!({"type": "Other"}), &["Known"]);
        assert!(matches!(unknown, Err(SchemaError::UnknownType { type_name, .. }) if type_name == "Other"));
    }

    #[test]
    fn known_tag_deserializes() {
        let Probe::Known { value } =
            parse_tagged(Category::Constant, "k", &json!({"type": "Known", "value": 2}), &["Known"])
                .unwrap();
        assert_eq!(value, 2.0);
    }

    #[test]
    fn ordering_rejects_equal_and_nan() {
        assert!(check_ordered(Category::Variable, "x", 0.0, 1.0).is_ok());
        assert!(check_ordered(Category::Variable, "x", 1.0, 1.0).is_err());
        assert!(check_ordered(Category::Variable, "x", f64::NAN, 1.0).is_err());
        assert!(check_ordered(Category::Variable, "x", 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn ordering_rejects_overflowing_width() {
        assert!(check_ordered(Category::Variable, "x", -1e308, 0.0).is_ok());
        let err = check_ordered(Category::Variable, "x", -1e308, 1e308).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDomain { .. }));
    }
}
