use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::{VisibilityOutcome, evaluate};
use crate::spec::{
    FieldDefinition, FieldId, FormDefinition, SectionDefinition, SectionId,
    TransitionDefinition, TransitionId, VisibilityRule,
};
use crate::values::ValueSnapshot;

/// Form elements that carry their own visibility clause.
pub trait Conditional {
    fn element_id(&self) -> u64;
    fn visibility_rule(&self) -> Option<&VisibilityRule>;
}

impl Conditional for FieldDefinition {
    fn element_id(&self) -> u64 {
        self.id
    }

    fn visibility_rule(&self) -> Option<&VisibilityRule> {
        self.visibility_rule.as_ref()
    }
}

impl Conditional for SectionDefinition {
    fn element_id(&self) -> u64 {
        self.id
    }

    fn visibility_rule(&self) -> Option<&VisibilityRule> {
        self.visibility_rule.as_ref()
    }
}

impl Conditional for TransitionDefinition {
    fn element_id(&self) -> u64 {
        self.id
    }

    fn visibility_rule(&self) -> Option<&VisibilityRule> {
        self.visibility_rule.as_ref()
    }
}

/// Complete visibility lookup for a form. Rebuilt wholesale on every value change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityMap {
    pub fields: BTreeMap<FieldId, bool>,
    pub sections: BTreeMap<SectionId, bool>,
    pub transitions: BTreeMap<TransitionId, bool>,
}

impl VisibilityMap {
    pub fn is_field_visible(&self, id: FieldId) -> bool {
        self.fields.get(&id).copied().unwrap_or(true)
    }

    pub fn is_section_visible(&self, id: SectionId) -> bool {
        self.sections.get(&id).copied().unwrap_or(true)
    }

    pub fn is_transition_visible(&self, id: TransitionId) -> bool {
        self.transitions.get(&id).copied().unwrap_or(true)
    }
}

/// Per-element outcomes including the reason, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibilityReport {
    pub fields: BTreeMap<FieldId, VisibilityOutcome>,
    pub sections: BTreeMap<SectionId, VisibilityOutcome>,
    pub transitions: BTreeMap<TransitionId, VisibilityOutcome>,
}

impl VisibilityReport {
    pub fn to_map(&self) -> VisibilityMap {
        VisibilityMap {
            fields: flags(&self.fields),
            sections: flags(&self.sections),
            transitions: flags(&self.transitions),
        }
    }
}

fn flags(outcomes: &BTreeMap<u64, VisibilityOutcome>) -> BTreeMap<u64, bool> {
    outcomes
        .iter()
        .map(|(id, outcome)| (*id, outcome.is_visible))
        .collect()
}

fn resolve_collection<T: Conditional>(
    items: &[T],
    values: &ValueSnapshot,
) -> BTreeMap<u64, VisibilityOutcome> {
    items
        .iter()
        .map(|item| (item.element_id(), evaluate(item.visibility_rule(), values)))
        .collect()
}

/// Evaluates the three collections independently; a hidden section does not hide its fields.
pub fn explain_visibility_of(
    fields: &[FieldDefinition],
    sections: &[SectionDefinition],
    transitions: &[TransitionDefinition],
    values: &ValueSnapshot,
) -> VisibilityReport {
    VisibilityReport {
        fields: resolve_collection(fields, values),
        sections: resolve_collection(sections, values),
        transitions: resolve_collection(transitions, values),
    }
}

pub fn build_visibility_map(
    fields: &[FieldDefinition],
    sections: &[SectionDefinition],
    transitions: &[TransitionDefinition],
    values: &ValueSnapshot,
) -> VisibilityMap {
    explain_visibility_of(fields, sections, transitions, values).to_map()
}

pub fn resolve_visibility(form: &FormDefinition, values: &ValueSnapshot) -> VisibilityMap {
    build_visibility_map(&form.fields, &form.sections, &form.transitions, values)
}

pub fn explain_visibility(form: &FormDefinition, values: &ValueSnapshot) -> VisibilityReport {
    explain_visibility_of(&form.fields, &form.sections, &form.transitions, values)
}
