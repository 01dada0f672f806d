use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::{FieldDefinition, FieldId};
use crate::spec::rule::VisibilityRule;

pub type SectionId = u64;
pub type TransitionId = u64;

/// A step of a multi-step form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionDefinition {
    pub id: SectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "visibility",
        alias = "visibility_condition",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_rule: Option<VisibilityRule>,
}

/// An edge between two sections, shown or hidden by its own condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionDefinition {
    pub id: TransitionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_section_id: Option<SectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_section_id: Option<SectionId>,
    #[serde(
        default,
        alias = "visibility",
        alias = "visibility_condition",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_rule: Option<VisibilityRule>,
}

/// Top-level form definition as supplied by the configuration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionDefinition>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionDefinition>,
}

impl FormDefinition {
    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }
}
