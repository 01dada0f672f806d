use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::form::SectionId;
use crate::spec::rule::{FieldRule, VisibilityRule};

pub type FieldId = u64;

/// Input kinds understood by the contract synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    #[serde(alias = "long_text")]
    Textarea,
    Email,
    Url,
    Phone,
    Password,
    #[serde(alias = "numeric")]
    Number,
    Percentage,
    #[serde(alias = "dropdown")]
    Select,
    Radio,
    #[serde(alias = "checkboxes", alias = "multi_select")]
    Checkbox,
    Date,
    File,
    Video,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Percentage)
    }

    pub fn is_upload(self) -> bool {
        matches!(self, FieldType::File | FieldType::Video)
    }

    pub fn is_multi_choice(self) -> bool {
        matches!(self, FieldType::Checkbox)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Phone => "phone",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Percentage => "percentage",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Video => "video",
            FieldType::Unknown => "unknown",
        }
    }
}

/// A single input of a multi-step form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    pub id: FieldId,
    #[serde(rename = "type", alias = "field_type")]
    pub kind: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
    #[serde(default, alias = "field_rules", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FieldRule>,
    #[serde(
        default,
        alias = "visibility",
        alias = "visibility_condition",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_rule: Option<VisibilityRule>,
}

impl FieldDefinition {
    pub fn new(id: FieldId, kind: FieldType) -> Self {
        Self {
            id,
            kind,
            label: String::new(),
            section_id: None,
            rules: Vec::new(),
            visibility_rule: None,
        }
    }

    pub fn with_rules(mut self, rules: Vec<FieldRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_visibility(mut self, rule: VisibilityRule) -> Self {
        self.visibility_rule = Some(rule);
        self
    }
}
