use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::EvalError;
use crate::normalize::{
    contains_ci, ends_with_ci, is_empty, normalize, starts_with_ci, structurally_equal,
};

/// Supported comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Empty,
    Filled,
}

pub type Comparator = fn(&Value, &Value) -> bool;

/// Operator spellings accepted from configuration, legacy aliases included.
const OPERATOR_NAMES: &[(&str, Operator)] = &[
    ("equals", Operator::Equals),
    ("equal", Operator::Equals),
    ("eq", Operator::Equals),
    ("is", Operator::Equals),
    ("==", Operator::Equals),
    ("=", Operator::Equals),
    ("not_equals", Operator::NotEquals),
    ("not_equal", Operator::NotEquals),
    ("neq", Operator::NotEquals),
    ("is_not", Operator::NotEquals),
    ("!=", Operator::NotEquals),
    ("greater_than", Operator::GreaterThan),
    ("gt", Operator::GreaterThan),
    (">", Operator::GreaterThan),
    ("greater_or_equal", Operator::GreaterOrEqual),
    ("greater_than_or_equal", Operator::GreaterOrEqual),
    ("gte", Operator::GreaterOrEqual),
    (">=", Operator::GreaterOrEqual),
    ("less_than", Operator::LessThan),
    ("lt", Operator::LessThan),
    ("<", Operator::LessThan),
    ("less_or_equal", Operator::LessOrEqual),
    ("less_than_or_equal", Operator::LessOrEqual),
    ("lte", Operator::LessOrEqual),
    ("<=", Operator::LessOrEqual),
    ("contains", Operator::Contains),
    ("not_contains", Operator::NotContains),
    ("does_not_contain", Operator::NotContains),
    ("starts_with", Operator::StartsWith),
    ("ends_with", Operator::EndsWith),
    ("in", Operator::In),
    ("not_in", Operator::NotIn),
    ("empty", Operator::Empty),
    ("is_empty", Operator::Empty),
    ("filled", Operator::Filled),
    ("not_empty", Operator::Filled),
    ("is_not_empty", Operator::Filled),
];

impl Operator {
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        OPERATOR_NAMES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, operator)| *operator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessOrEqual => "less_or_equal",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Empty => "empty",
            Operator::Filled => "filled",
        }
    }

    fn comparator(self) -> Comparator {
        match self {
            Operator::Equals => structurally_equal,
            Operator::NotEquals => |field, compare| !structurally_equal(field, compare),
            Operator::GreaterThan => |field, compare| compare_numbers(field, compare, |a, b| a > b),
            Operator::GreaterOrEqual => {
                |field, compare| compare_numbers(field, compare, |a, b| a >= b)
            }
            Operator::LessThan => |field, compare| compare_numbers(field, compare, |a, b| a < b),
            Operator::LessOrEqual => {
                |field, compare| compare_numbers(field, compare, |a, b| a <= b)
            }
            Operator::Contains => contains,
            Operator::NotContains => |field, compare| !contains(field, compare),
            Operator::StartsWith => starts_with_ci,
            Operator::EndsWith => ends_with_ci,
            Operator::In => is_member,
            Operator::NotIn => |field, compare| compare.is_array() && !is_member(field, compare),
            Operator::Empty => |field, _| is_empty(field),
            Operator::Filled => |field, _| !is_empty(field),
        }
    }

    pub fn apply(self, field_value: &Value, compare_value: &Value) -> bool {
        (self.comparator())(field_value, compare_value)
    }
}

impl FromStr for Operator {
    type Err = EvalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operator::lookup(name).ok_or_else(|| EvalError::UnknownOperator(name.to_string()))
    }
}

/// String-keyed entry point for operators sourced from configuration.
pub fn evaluate(
    field_value: &Value,
    operator: &str,
    compare_value: &Value,
) -> Result<bool, EvalError> {
    let operator: Operator = operator.parse()?;
    Ok(operator.apply(field_value, compare_value))
}

fn compare_numbers(field: &Value, compare: &Value, predicate: fn(f64, f64) -> bool) -> bool {
    match (normalize(field).as_number(), normalize(compare).as_number()) {
        (Some(left), Some(right)) => predicate(left, right),
        _ => false,
    }
}

fn contains(field: &Value, compare: &Value) -> bool {
    match field {
        Value::Array(items) => items.iter().any(|item| structurally_equal(item, compare)),
        _ => contains_ci(field, compare),
    }
}

fn is_member(field: &Value, compare: &Value) -> bool {
    let Some(options) = compare.as_array() else {
        return false;
    };
    options.iter().any(|option| structurally_equal(field, option))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aliases_resolve_to_same_operator() {
        assert_eq!(Operator::lookup(">="), Some(Operator::GreaterOrEqual));
        assert_eq!(
            Operator::lookup("greater_than_or_equal"),
            Some(Operator::GreaterOrEqual)
        );
        assert_eq!(Operator::lookup("!="), Some(Operator::NotEquals));
        assert_eq!(Operator::lookup("between"), None);
    }

    #[test]
    fn every_operator_round_trips_through_its_name() {
        for (_, operator) in OPERATOR_NAMES {
            assert_eq!(Operator::lookup(operator.as_str()), Some(*operator));
        }
    }

    #[test]
    fn unknown_operator_is_an_error() {
        assert_eq!(
            evaluate(&json!(1), "roughly", &json!(1)),
            Err(EvalError::UnknownOperator("roughly".into()))
        );
    }

    #[test]
    fn numeric_operators_reject_non_numbers() {
        assert_eq!(
            evaluate(&json!("abc"), "greater_than", &json!(5)),
            Ok(false)
        );
        assert_eq!(evaluate(&json!(null), "less_than", &json!(5)), Ok(false));
        assert_eq!(evaluate(&json!(15), ">", &json!(10)), Ok(true));
        assert_eq!(evaluate(&json!("15"), "gte", &json!("15")), Ok(true));
        assert_eq!(evaluate(&json!(3), "<=", &json!(2)), Ok(false));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            evaluate(&json!(["a", "b"]), "equals", &json!(["a", "b"])),
            Ok(true)
        );
        assert_eq!(evaluate(&json!({"x": 1}), "!=", &json!({"x": 2})), Ok(true));
        assert_eq!(evaluate(&json!(null), "equals", &json!(null)), Ok(true));
    }

    #[test]
    fn contains_uses_membership_for_arrays() {
        assert_eq!(
            evaluate(&json!(["red", "blue"]), "contains", &json!("blue")),
            Ok(true)
        );
        assert_eq!(
            evaluate(&json!(["red", "blue"]), "contains", &json!("blu")),
            Ok(false)
        );
        assert_eq!(
            evaluate(&json!("Dark Blue"), "contains", &json!("blue")),
            Ok(true)
        );
        assert_eq!(
            evaluate(&json!("Dark Blue"), "not_contains", &json!("green")),
            Ok(true)
        );
    }

    #[test]
    fn prefix_and_suffix_ignore_case() {
        assert_eq!(
            evaluate(&json!("ACME-42"), "starts_with", &json!("acme")),
            Ok(true)
        );
        assert_eq!(
            evaluate(&json!("ACME-42"), "ends_with", &json!("-42")),
            Ok(true)
        );
        assert_eq!(
            evaluate(&json!("ACME-42"), "ends_with", &json!("acme")),
            Ok(false)
        );
    }

    #[test]
    fn set_membership_requires_array_operand() {
        assert_eq!(evaluate(&json!("b"), "in", &json!(["a", "b"])), Ok(true));
        assert_eq!(
            evaluate(&json!("c"), "not_in", &json!(["a", "b"])),
            Ok(true)
        );
        assert_eq!(evaluate(&json!("b"), "in", &json!("b")), Ok(false));
        assert_eq!(evaluate(&json!("b"), "not_in", &json!("b")), Ok(false));
    }

    #[test]
    fn emptiness_operators_ignore_operand() {
        assert_eq!(evaluate(&json!(""), "empty", &Value::Null), Ok(true));
        assert_eq!(
            evaluate(&json!([1]), "filled", &json!("anything")),
            Ok(true)
        );
    }
}
