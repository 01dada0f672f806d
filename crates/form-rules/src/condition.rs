use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EvalError;
use crate::operator::Operator;
use crate::spec::{FieldId, VisibilityRule};
use crate::values::ValueSnapshot;

/// One `field / operator / value` comparison.
///
/// The operator is kept as written in the configuration and resolved on evaluation, so an
/// unknown operator surfaces as an [`EvalError`] rather than a load failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleCondition {
    #[serde(alias = "fieldId")]
    pub field_id: FieldId,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl SimpleCondition {
    pub fn new(field_id: FieldId, operator: impl Into<String>, value: Value) -> Self {
        Self {
            field_id,
            operator: operator.into(),
            value,
        }
    }
}

/// Boolean combinator of a complex condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    /// Resolves a configured combinator. Anything other than `and`/`or` (including
    /// differently cased spellings) combines with `and`.
    pub fn resolve(logic: &str) -> Self {
        match logic {
            "and" => Logic::And,
            "or" => Logic::Or,
            other => {
                debug!(
                    logic = other,
                    "unrecognised combinator, combining with 'and'"
                );
                Logic::And
            }
        }
    }
}

/// AND/OR composition of simple conditions. Nesting is one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexCondition {
    pub logic: String,
    #[serde(default)]
    pub conditions: Vec<SimpleCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Simple(SimpleCondition),
    Complex(ComplexCondition),
}

impl Condition {
    /// Detects the condition shape of a raw `show_when` clause.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed("condition must be an object"))?;
        if is_complex_shape(object) {
            parse_complex(object).map(Condition::Complex)
        } else if is_simple_shape(object) {
            parse_simple(object).map(Condition::Simple)
        } else {
            Err(malformed(
                "expected either field_id/operator or logic/conditions",
            ))
        }
    }

    pub fn evaluate(&self, values: &ValueSnapshot) -> Result<bool, EvalError> {
        match self {
            Condition::Simple(condition) => evaluate_simple(condition, values),
            Condition::Complex(condition) => evaluate_complex(condition, values),
        }
    }
}

fn malformed(detail: &str) -> EvalError {
    EvalError::MalformedCondition(detail.to_string())
}

fn field_id_key(object: &Map<String, Value>) -> Option<&Value> {
    object.get("field_id").or_else(|| object.get("fieldId"))
}

fn is_simple_shape(object: &Map<String, Value>) -> bool {
    field_id_key(object).is_some() && object.contains_key("operator")
}

fn is_complex_shape(object: &Map<String, Value>) -> bool {
    object.contains_key("logic") && object.contains_key("conditions")
}

fn parse_simple(object: &Map<String, Value>) -> Result<SimpleCondition, EvalError> {
    let field_id = field_id_key(object)
        .and_then(parse_field_id)
        .ok_or_else(|| malformed("field_id must be a non-negative integer"))?;
    let operator = object
        .get("operator")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("operator must be a string"))?;
    Ok(SimpleCondition {
        field_id,
        operator: operator.to_string(),
        value: object.get("value").cloned().unwrap_or(Value::Null),
    })
}

fn parse_field_id(value: &Value) -> Option<FieldId> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_complex(object: &Map<String, Value>) -> Result<ComplexCondition, EvalError> {
    let logic = object
        .get("logic")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("logic must be a string"))?;
    let entries = object
        .get("conditions")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("conditions must be an array"))?;

    let mut conditions = Vec::with_capacity(entries.len());
    for entry in entries {
        let sub = entry
            .as_object()
            .ok_or_else(|| malformed("sub-condition must be an object"))?;
        if is_complex_shape(sub) {
            return Err(EvalError::NestedComplex);
        }
        if !is_simple_shape(sub) {
            return Err(malformed("sub-condition must have field_id and operator"));
        }
        conditions.push(parse_simple(sub)?);
    }

    Ok(ComplexCondition {
        logic: logic.to_string(),
        conditions,
    })
}

/// Evaluates one comparison. A field absent from the snapshot does not satisfy it, whatever
/// the operator; the operator is only resolved once a value is present.
pub fn evaluate_simple(
    condition: &SimpleCondition,
    values: &ValueSnapshot,
) -> Result<bool, EvalError> {
    let Some(current) = values.get(&condition.field_id) else {
        return Ok(false);
    };
    let operator: Operator = condition.operator.parse()?;
    Ok(operator.apply(&current.value, &condition.value))
}

/// Evaluates every sub-condition, then combines. An empty list is vacuously true.
pub fn evaluate_complex(
    condition: &ComplexCondition,
    values: &ValueSnapshot,
) -> Result<bool, EvalError> {
    if condition.conditions.is_empty() {
        return Ok(true);
    }
    let results = condition
        .conditions
        .iter()
        .map(|sub| evaluate_simple(sub, values))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match Logic::resolve(&condition.logic) {
        Logic::And => results.iter().all(|result| *result),
        Logic::Or => results.iter().any(|result| *result),
    })
}

/// Why an element ended up visible or hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum VisibilityReason {
    /// No `show_when` clause.
    Unconditional,
    Satisfied,
    NotSatisfied,
    /// Evaluation failed; shown anyway.
    FailOpen(String),
}

impl fmt::Display for VisibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityReason::Unconditional => f.write_str("no condition"),
            VisibilityReason::Satisfied => f.write_str("condition satisfied"),
            VisibilityReason::NotSatisfied => f.write_str("condition not satisfied"),
            VisibilityReason::FailOpen(detail) => write!(f, "evaluation failed: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityOutcome {
    pub is_visible: bool,
    pub reason: VisibilityReason,
}

impl VisibilityOutcome {
    fn visible(reason: VisibilityReason) -> Self {
        Self {
            is_visible: true,
            reason,
        }
    }
}

/// Top-level visibility decision for one element.
///
/// This is the only place evaluation errors are recovered: any [`EvalError`] becomes a
/// visible outcome carrying the diagnostic.
pub fn evaluate(rule: Option<&VisibilityRule>, values: &ValueSnapshot) -> VisibilityOutcome {
    let clause = rule
        .and_then(|rule| rule.show_when.as_ref())
        .filter(|clause| !clause.is_null());
    let Some(clause) = clause else {
        return VisibilityOutcome::visible(VisibilityReason::Unconditional);
    };

    match Condition::from_value(clause).and_then(|condition| condition.evaluate(values)) {
        Ok(true) => VisibilityOutcome::visible(VisibilityReason::Satisfied),
        Ok(false) => VisibilityOutcome {
            is_visible: false,
            reason: VisibilityReason::NotSatisfied,
        },
        Err(err) => {
            debug!(error = %err, "visibility evaluation failed, showing element");
            VisibilityOutcome::visible(VisibilityReason::FailOpen(err.to_string()))
        }
    }
}
