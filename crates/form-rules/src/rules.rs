//! Extraction of typed validation parameters from a field's declarative rule list.
//!
//! Every rule name maps to one extractor in a static table. Extractors only record what
//! was declared; precedence between overlapping rules is applied afterwards in
//! [`RuleDeclarations::resolve`], so the result never depends on declaration order.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::spec::{FieldId, FieldRule, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ValidationBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValidationBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Character-format constraint. At most one applies to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum FormatConstraint {
    Regex(String),
    Alpha,
    AlphaNum,
    AlphaDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossFieldKind {
    Same,
    Different,
}

/// Comparison against a sibling field, resolved by the form-level pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrossFieldRule {
    pub kind: CrossFieldKind,
    pub field_id: FieldId,
}

/// Resolved parameters for one field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RuleParameters {
    pub required: bool,
    pub bounds: ValidationBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatConstraint>,
    pub email: bool,
    pub url: bool,
    pub integer: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub starts_with: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ends_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mime_types: Vec<String>,
    pub file_size_kb: ValidationBounds,
    pub duration_seconds: ValidationBounds,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cross_field: Vec<CrossFieldRule>,
    /// Custom message templates keyed by rule name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, String>,
}

/// Raw declarations collected in one pass over the rule list.
#[derive(Debug, Default)]
struct RuleDeclarations {
    required: bool,
    between: Option<ValidationBounds>,
    min: Option<f64>,
    max: Option<f64>,
    alpha: bool,
    alpha_num: bool,
    alpha_dash: bool,
    regex: Option<String>,
    email: bool,
    url: bool,
    integer: bool,
    starts_with: Vec<String>,
    ends_with: Vec<String>,
    allowed_values: Option<Vec<Value>>,
    mime_types: Vec<String>,
    min_file_size: Option<f64>,
    max_file_size: Option<f64>,
    min_duration: Option<f64>,
    max_duration: Option<f64>,
    cross_field: Vec<CrossFieldRule>,
}

impl RuleDeclarations {
    fn resolve(self) -> RuleParameters {
        let mut bounds = self.between.unwrap_or_default();
        if let Some(min) = self.min {
            bounds.min = Some(min);
        }
        if let Some(max) = self.max {
            bounds.max = Some(max);
        }

        let format = match self.regex {
            Some(pattern) => Some(FormatConstraint::Regex(pattern)),
            None if self.alpha => Some(FormatConstraint::Alpha),
            None if self.alpha_num => Some(FormatConstraint::AlphaNum),
            None if self.alpha_dash => Some(FormatConstraint::AlphaDash),
            None => None,
        };

        RuleParameters {
            required: self.required,
            bounds,
            format,
            email: self.email,
            url: self.url,
            integer: self.integer,
            starts_with: self.starts_with,
            ends_with: self.ends_with,
            allowed_values: self.allowed_values,
            mime_types: self.mime_types,
            file_size_kb: ValidationBounds::new(self.min_file_size, self.max_file_size),
            duration_seconds: ValidationBounds::new(self.min_duration, self.max_duration),
            cross_field: self.cross_field,
            messages: BTreeMap::new(),
        }
    }
}

type Extractor = fn(&Map<String, Value>, &mut RuleDeclarations);

/// Field types a rule is meaningful for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    Any,
    Upload,
    Video,
}

impl RuleScope {
    fn admits(self, kind: FieldType) -> bool {
        match self {
            RuleScope::Any => true,
            RuleScope::Upload => kind.is_upload(),
            RuleScope::Video => kind == FieldType::Video,
        }
    }
}

static EXTRACTORS: LazyLock<HashMap<&'static str, (RuleScope, Extractor)>> = LazyLock::new(|| {
    let table: [(&'static str, RuleScope, Extractor); 22] = [
        ("required", RuleScope::Any, |_, decl| decl.required = true),
        ("between", RuleScope::Any, |props, decl| {
            decl.between = Some(ValidationBounds::new(
                number_prop(props, &["min"]),
                number_prop(props, &["max"]),
            ));
        }),
        ("min", RuleScope::Any, |props, decl| {
            decl.min = number_prop(props, &["value", "min"]);
        }),
        ("max", RuleScope::Any, |props, decl| {
            decl.max = number_prop(props, &["value", "max"]);
        }),
        ("alpha", RuleScope::Any, |_, decl| decl.alpha = true),
        ("alpha_num", RuleScope::Any, |_, decl| decl.alpha_num = true),
        ("alpha_dash", RuleScope::Any, |_, decl| decl.alpha_dash = true),
        ("regex", RuleScope::Any, |props, decl| {
            decl.regex = string_prop(props, &["pattern", "regex", "value"]);
        }),
        ("email", RuleScope::Any, |_, decl| decl.email = true),
        ("url", RuleScope::Any, |_, decl| decl.url = true),
        ("integer", RuleScope::Any, |_, decl| decl.integer = true),
        ("starts_with", RuleScope::Any, |props, decl| {
            decl.starts_with = string_list_prop(props, &["values", "value", "prefixes"]);
        }),
        ("ends_with", RuleScope::Any, |props, decl| {
            decl.ends_with = string_list_prop(props, &["values", "value", "suffixes"]);
        }),
        ("in", RuleScope::Any, |props, decl| {
            decl.allowed_values = value_list_prop(props, &["values", "options"]);
        }),
        ("mimetypes", RuleScope::Upload, |props, decl| {
            decl.mime_types
                .extend(string_list_prop(props, &["types", "mimetypes", "values"]));
        }),
        ("mimes", RuleScope::Upload, |props, decl| {
            decl.mime_types
                .extend(string_list_prop(props, &["types", "mimes", "values"]));
        }),
        ("min_file_size", RuleScope::Upload, |props, decl| {
            decl.min_file_size = number_prop(props, &["minsize", "size", "value"]);
        }),
        ("max_file_size", RuleScope::Upload, |props, decl| {
            decl.max_file_size = number_prop(props, &["maxsize", "size", "value"]);
        }),
        ("min_duration", RuleScope::Video, |props, decl| {
            decl.min_duration = number_prop(props, &["seconds", "value"]);
        }),
        ("max_duration", RuleScope::Video, |props, decl| {
            decl.max_duration = number_prop(props, &["seconds", "value"]);
        }),
        ("same", RuleScope::Any, |props, decl| {
            push_cross_field(props, decl, CrossFieldKind::Same);
        }),
        ("different", RuleScope::Any, |props, decl| {
            push_cross_field(props, decl, CrossFieldKind::Different);
        }),
    ];
    table
        .into_iter()
        .map(|(name, scope, extractor)| (name, (scope, extractor)))
        .collect()
});

/// Scans `rules` once and resolves the field's parameters.
///
/// Precedence: `between` sets the baseline bounds and standalone `min`/`max` override
/// them; `regex` replaces any character-format rule, otherwise the most restrictive of
/// `alpha`, `alpha_num`, `alpha_dash` applies. A repeated rule name keeps its last
/// declaration, except `mimetypes`/`mimes` which accumulate.
pub fn extract_rules(kind: FieldType, rules: &[FieldRule]) -> RuleParameters {
    let mut declarations = RuleDeclarations::default();
    let mut messages = BTreeMap::new();

    for rule in rules {
        let name = rule.rule_name.trim();
        let Some((scope, extract)) = EXTRACTORS.get(name) else {
            debug!(rule = name, "ignoring unknown rule");
            continue;
        };
        if !scope.admits(kind) {
            debug!(
                rule = name,
                field_type = kind.as_str(),
                "rule does not apply to field type"
            );
            continue;
        }
        extract(&rule.rule_props, &mut declarations);
        if let Some(message) = string_prop(&rule.rule_props, &["message"]) {
            messages.insert(name.to_string(), message);
        }
    }

    let mut params = declarations.resolve();
    params.messages = messages;
    params
}

fn push_cross_field(
    props: &Map<String, Value>,
    decl: &mut RuleDeclarations,
    kind: CrossFieldKind,
) {
    let field_id = ["field_id", "fieldId", "field", "other"]
        .iter()
        .find_map(|key| props.get(*key))
        .and_then(|value| match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        });
    match field_id {
        Some(field_id) => decl.cross_field.push(CrossFieldRule { kind, field_id }),
        None => debug!(?kind, "cross-field rule without a comparison field"),
    }
}

fn first_prop<'a>(props: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| props.get(*key))
}

fn number_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let number = match first_prop(props, keys)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn string_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_prop(props, keys)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|text| !text.is_empty())
}

/// A list of strings, a single string, or a comma separated string.
fn string_list_prop(props: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let split = |text: &str| {
        text.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    match first_prop(props, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .filter(|entry| !entry.is_empty())
            .collect(),
        Some(Value::String(text)) => split(text),
        _ => Vec::new(),
    }
}

fn value_list_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<Vec<Value>> {
    match first_prop(props, keys)? {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) => Some(
            text.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| Value::String(entry.to_string()))
                .collect(),
        ),
        _ => None,
    }
}
