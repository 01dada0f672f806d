//! Canonical forms of field values and comparison operands.
//!
//! Composite values are compared structurally through their canonical JSON text, so two
//! arrays with the same elements are equal regardless of where they came from.

use serde_json::{Map, Value};

/// Primitive view of a value used by every comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Normalized {
    /// Numeric view of the value. Numeric strings count as numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Normalized::Number(number) if number.is_finite() => Some(*number),
            Normalized::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
            }
            _ => None,
        }
    }
}

pub fn normalize(value: &Value) -> Normalized {
    match value {
        Value::Null => Normalized::Null,
        Value::Bool(flag) => Normalized::Bool(*flag),
        Value::Number(number) => number
            .as_f64()
            .map_or(Normalized::Null, Normalized::Number),
        Value::String(text) => Normalized::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => Normalized::Text(canonical_json(value)),
    }
}

/// JSON text of `value` with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries = map.iter().collect::<Vec<_>>();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let sorted = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), sort_keys(value)))
                .collect::<Map<_, _>>();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// String coercion used by the text operators. `null` coerces to the empty string.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => canonical_json(value),
    }
}

pub fn contains_ci(haystack: &Value, needle: &Value) -> bool {
    coerce_text(haystack)
        .to_lowercase()
        .contains(&coerce_text(needle).to_lowercase())
}

pub fn starts_with_ci(value: &Value, prefix: &Value) -> bool {
    coerce_text(value)
        .to_lowercase()
        .starts_with(&coerce_text(prefix).to_lowercase())
}

pub fn ends_with_ci(value: &Value, suffix: &Value) -> bool {
    coerce_text(value)
        .to_lowercase()
        .ends_with(&coerce_text(suffix).to_lowercase())
}

pub fn structurally_equal(left: &Value, right: &Value) -> bool {
    normalize(left) == normalize(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_values_normalize_to_sorted_json() {
        let left = json!({ "b": 1, "a": [1, { "d": 2, "c": 3 }] });
        let right = json!({ "a": [1, { "c": 3, "d": 2 }], "b": 1 });
        assert_eq!(normalize(&left), normalize(&right));
        assert_eq!(
            normalize(&json!([1, 2])),
            Normalized::Text("[1,2]".into())
        );
    }

    #[test]
    fn integers_and_floats_compare_equal() {
        assert!(structurally_equal(&json!(10), &json!(10.0)));
        assert!(!structurally_equal(&json!(10), &json!("10")));
    }

    #[test]
    fn emptiness_follows_value_shape() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("   ")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!(" x ")));
    }

    #[test]
    fn numeric_strings_are_numbers() {
        assert_eq!(normalize(&json!(" 12.5 ")).as_number(), Some(12.5));
        assert_eq!(normalize(&json!("abc")).as_number(), None);
        assert_eq!(normalize(&json!("")).as_number(), None);
        assert_eq!(normalize(&json!(true)).as_number(), None);
    }

    #[test]
    fn text_helpers_ignore_case() {
        assert!(contains_ci(&json!("Hello World"), &json!("WORLD")));
        assert!(starts_with_ci(&json!("Prefix-1"), &json!("prefix")));
        assert!(ends_with_ci(&json!("report.PDF"), &json!(".pdf")));
        assert!(!contains_ci(&Value::Null, &json!("x")));
    }
}
