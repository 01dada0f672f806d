use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::FieldContract;
use crate::error::ValidationFailure;
use crate::normalize::{is_empty, structurally_equal};
use crate::rules::{CrossFieldKind, CrossFieldRule};
use crate::spec::{FieldId, FormDefinition};
use crate::values::ValueSnapshot;
use crate::visibility::resolve_visibility;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field_id: FieldId,
    pub code: String,
    pub message: String,
}

/// Result of validating every visible field of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<FieldId>,
}

/// Form-level pass: per-field contracts for visible fields, then the deferred
/// `same`/`different` comparisons against sibling values.
pub fn validate_form(form: &FormDefinition, values: &ValueSnapshot) -> FormValidationReport {
    let visibility = resolve_visibility(form, values);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in &form.fields {
        if !visibility.is_field_visible(field.id) {
            continue;
        }
        let contract = FieldContract::synthesize(field);

        let Some(current) = values.get(&field.id) else {
            if contract.is_required() {
                missing_required.push(field.id);
            }
            continue;
        };

        let failure = contract.check(&current.value).err().or_else(|| {
            if is_empty(&current.value) {
                return None;
            }
            contract
                .parameters()
                .cross_field
                .iter()
                .find_map(|rule| check_cross_field(rule, &current.value, values))
        });

        if let Some(failure) = failure {
            errors.push(FieldError {
                field_id: field.id,
                code: failure.code().to_string(),
                message: contract.message_for(&failure),
            });
        }
    }

    FormValidationReport {
        valid: errors.is_empty() && missing_required.is_empty(),
        errors,
        missing_required,
    }
}

fn check_cross_field(
    rule: &CrossFieldRule,
    value: &Value,
    values: &ValueSnapshot,
) -> Option<ValidationFailure> {
    let other = values
        .get(&rule.field_id)
        .map(|other| &other.value)
        .unwrap_or(&Value::Null);
    let equal = structurally_equal(value, other);
    match rule.kind {
        CrossFieldKind::Same if !equal => Some(ValidationFailure::NotSame {
            field_id: rule.field_id,
        }),
        CrossFieldKind::Different if equal => Some(ValidationFailure::NotDifferent {
            field_id: rule.field_id,
        }),
        _ => None,
    }
}
