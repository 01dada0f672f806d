//! Runtime validation contracts synthesized from extracted rule parameters.
//!
//! Checks run in a fixed order and stop at the first failure:
//! required, format, bounds, then type specific checks.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::ValidationFailure;
use crate::messages::MessageTemplates;
use crate::mime::MimeMatcher;
use crate::normalize::{coerce_text, is_empty, normalize, structurally_equal};
use crate::rules::{FormatConstraint, RuleParameters, ValidationBounds, extract_rules};
use crate::spec::{FieldDefinition, FieldId, FieldType, FormDefinition};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?|ftp)://[^\s/$.?#][^\s]*$").expect("url pattern compiles")
});

const PERCENTAGE_BOUNDS: ValidationBounds = ValidationBounds {
    min: Some(0.0),
    max: Some(100.0),
};

/// Result of one `validate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
            code: None,
        }
    }
}

/// Metadata of an uploaded artifact as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", alias = "mime_type", alias = "mimeType", default)]
    pub mime_type: String,
    /// Size in bytes. Hosts may report it as a float.
    pub size: f64,
    /// Duration in seconds, for videos.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl UploadMetadata {
    fn size_kb(&self) -> f64 {
        self.size / 1024.0
    }
}

#[derive(Debug, Clone)]
enum FormatCheck {
    Regex(Regex),
    /// The configured pattern did not compile; always passes.
    Skipped,
    Alpha,
    AlphaNum,
    AlphaDash,
}

impl FormatCheck {
    fn compile(constraint: &FormatConstraint, field_id: FieldId) -> Self {
        match constraint {
            FormatConstraint::Regex(pattern) => match compile_pattern(pattern) {
                Ok(regex) => FormatCheck::Regex(regex),
                Err(err) => {
                    warn!(
                        field_id,
                        pattern = %pattern,
                        error = %err,
                        "skipping invalid regex rule"
                    );
                    FormatCheck::Skipped
                }
            },
            FormatConstraint::Alpha => FormatCheck::Alpha,
            FormatConstraint::AlphaNum => FormatCheck::AlphaNum,
            FormatConstraint::AlphaDash => FormatCheck::AlphaDash,
        }
    }

    fn check(&self, text: &str) -> Result<(), ValidationFailure> {
        let ok = match self {
            FormatCheck::Regex(regex) => regex.is_match(text),
            FormatCheck::Skipped => true,
            FormatCheck::Alpha => text.chars().all(char::is_alphabetic),
            FormatCheck::AlphaNum => text.chars().all(char::is_alphanumeric),
            FormatCheck::AlphaDash => text
                .chars()
                .all(|ch| ch.is_alphanumeric() || ch == '-' || ch == '_'),
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            FormatCheck::Alpha => ValidationFailure::NotAlpha,
            FormatCheck::AlphaNum => ValidationFailure::NotAlphaNum,
            FormatCheck::AlphaDash => ValidationFailure::NotAlphaDash,
            FormatCheck::Regex(_) | FormatCheck::Skipped => ValidationFailure::PatternMismatch,
        })
    }
}

/// Compiles a pattern, accepting the delimited `/pattern/flags` form.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let delimited = pattern
        .strip_prefix('/')
        .and_then(|rest| rest.rsplit_once('/'))
        .filter(|(_, flags)| flags.chars().all(|flag| "gimsuy".contains(flag)));
    let Some((body, flags)) = delimited else {
        return Regex::new(pattern);
    };
    RegexBuilder::new(body)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
}

/// Synthesized validator for one field.
#[derive(Debug, Clone)]
pub struct FieldContract {
    field_id: FieldId,
    kind: FieldType,
    label: String,
    params: RuleParameters,
    bounds: ValidationBounds,
    format: Option<FormatCheck>,
    mime: MimeMatcher,
    messages: MessageTemplates,
}

impl FieldContract {
    pub fn synthesize(field: &FieldDefinition) -> Self {
        let params = extract_rules(field.kind, &field.rules);
        Self::from_parameters(field.id, field.kind, &field.label, params)
    }

    pub fn from_parameters(
        field_id: FieldId,
        kind: FieldType,
        label: &str,
        params: RuleParameters,
    ) -> Self {
        let mut bounds = params.bounds;
        if kind == FieldType::Percentage {
            bounds.min = bounds.min.or(PERCENTAGE_BOUNDS.min);
            bounds.max = bounds.max.or(PERCENTAGE_BOUNDS.max);
        }
        let format = params
            .format
            .as_ref()
            .map(|constraint| FormatCheck::compile(constraint, field_id));
        let mime = MimeMatcher::new(&params.mime_types);
        let messages = MessageTemplates::new(params.messages.clone());

        Self {
            field_id,
            kind,
            label: label.to_string(),
            params,
            bounds,
            format,
            mime,
            messages,
        }
    }

    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    pub fn kind(&self) -> FieldType {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.params.required
    }

    pub fn parameters(&self) -> &RuleParameters {
        &self.params
    }

    /// Bounds after type defaults are applied.
    pub fn effective_bounds(&self) -> ValidationBounds {
        self.bounds
    }

    pub fn validate(&self, value: &Value) -> ValidationOutcome {
        match self.check(value) {
            Ok(()) => ValidationOutcome::valid(),
            Err(failure) => ValidationOutcome {
                valid: false,
                error: Some(self.message_for(&failure)),
                code: Some(failure.code().to_string()),
            },
        }
    }

    pub fn message_for(&self, failure: &ValidationFailure) -> String {
        self.messages.render(failure, &self.label)
    }

    /// Runs the checks and returns the first failure.
    pub fn check(&self, value: &Value) -> Result<(), ValidationFailure> {
        if is_empty(value) {
            return if self.params.required {
                Err(ValidationFailure::Required)
            } else {
                Ok(())
            };
        }

        match self.kind {
            kind if kind.is_numeric() => self.check_number(value),
            kind if kind.is_multi_choice() => self.check_selection(value),
            kind if kind.is_upload() => self.check_uploads(value),
            _ => self.check_text(value),
        }
    }

    fn check_text(&self, value: &Value) -> Result<(), ValidationFailure> {
        let text = coerce_text(value);

        if let Some(format) = &self.format {
            format.check(&text)?;
        }

        let length = text.chars().count() as f64;
        if let Some(min) = self.bounds.min
            && length < min
        {
            return Err(ValidationFailure::TooShort { min });
        }
        if let Some(max) = self.bounds.max
            && length > max
        {
            return Err(ValidationFailure::TooLong { max });
        }

        let trimmed = text.trim();
        if (self.kind == FieldType::Email || self.params.email) && !EMAIL_RE.is_match(trimmed) {
            return Err(ValidationFailure::InvalidEmail);
        }
        if (self.kind == FieldType::Url || self.params.url) && !URL_RE.is_match(trimmed) {
            return Err(ValidationFailure::InvalidUrl);
        }
        self.check_affixes(value)?;
        self.check_allowed(value)
    }

    fn check_number(&self, value: &Value) -> Result<(), ValidationFailure> {
        let number = normalize(value)
            .as_number()
            .ok_or(ValidationFailure::NotANumber)?;
        if let Some(format) = &self.format {
            format.check(coerce_text(value).trim())?;
        }

        if let Some(min) = self.bounds.min
            && number < min
        {
            return Err(ValidationFailure::BelowMinimum { min });
        }
        if let Some(max) = self.bounds.max
            && number > max
        {
            return Err(ValidationFailure::AboveMaximum { max });
        }

        if self.params.integer && number.fract() != 0.0 {
            return Err(ValidationFailure::NotAnInteger);
        }
        self.check_affixes(value)?;
        self.check_allowed(value)
    }

    fn check_selection(&self, value: &Value) -> Result<(), ValidationFailure> {
        let selected = match value {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        if let Some(format) = &self.format {
            for item in &selected {
                format.check(&coerce_text(item))?;
            }
        }

        let count = selected.len() as f64;
        if let Some(min) = self.bounds.min
            && count < min
        {
            return Err(ValidationFailure::TooFewSelections { min });
        }
        if let Some(max) = self.bounds.max
            && count > max
        {
            return Err(ValidationFailure::TooManySelections { max });
        }

        selected.iter().try_for_each(|item| self.check_allowed(item))
    }

    fn check_uploads(&self, value: &Value) -> Result<(), ValidationFailure> {
        let uploads = match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        uploads
            .into_iter()
            .try_for_each(|upload| self.check_upload(upload))
    }

    fn check_upload(&self, value: &Value) -> Result<(), ValidationFailure> {
        let upload: UploadMetadata =
            serde_json::from_value(value.clone()).map_err(|_| ValidationFailure::InvalidFile)?;

        if !self.mime.matches(&upload.mime_type, upload.name.as_deref()) {
            return Err(ValidationFailure::FileTypeNotAllowed {
                mime: upload.mime_type.clone(),
                allowed: self.params.mime_types.clone(),
            });
        }

        let size_kb = upload.size_kb();
        if let Some(min_kb) = self.params.file_size_kb.min
            && size_kb < min_kb
        {
            return Err(ValidationFailure::FileTooSmall { min_kb });
        }
        if let Some(max_kb) = self.params.file_size_kb.max
            && size_kb > max_kb
        {
            return Err(ValidationFailure::FileTooLarge { max_kb });
        }

        let duration = self.params.duration_seconds;
        if duration.is_unbounded() {
            return Ok(());
        }
        let Some(seconds) = upload.duration else {
            return Err(ValidationFailure::InvalidFile);
        };
        if let Some(min) = duration.min
            && seconds < min
        {
            return Err(ValidationFailure::DurationTooShort { min });
        }
        if let Some(max) = duration.max
            && seconds > max
        {
            return Err(ValidationFailure::DurationTooLong { max });
        }
        Ok(())
    }

    /// Prefix and suffix lists: any entry may match.
    fn check_affixes(&self, value: &Value) -> Result<(), ValidationFailure> {
        let text = coerce_text(value).to_lowercase();
        let starts_with = &self.params.starts_with;
        if !starts_with.is_empty()
            && !starts_with
                .iter()
                .any(|prefix| text.starts_with(&prefix.to_lowercase()))
        {
            return Err(ValidationFailure::MissingPrefix {
                allowed: starts_with.clone(),
            });
        }
        let ends_with = &self.params.ends_with;
        if !ends_with.is_empty()
            && !ends_with
                .iter()
                .any(|suffix| text.ends_with(&suffix.to_lowercase()))
        {
            return Err(ValidationFailure::MissingSuffix {
                allowed: ends_with.clone(),
            });
        }
        Ok(())
    }

    fn check_allowed(&self, value: &Value) -> Result<(), ValidationFailure> {
        let Some(allowed) = &self.params.allowed_values else {
            return Ok(());
        };
        let text = coerce_text(value);
        let permitted = allowed
            .iter()
            .any(|option| structurally_equal(option, value) || coerce_text(option) == text);
        if permitted {
            Ok(())
        } else {
            Err(ValidationFailure::NotAllowed)
        }
    }

    /// JSON summary of the contract for diagnostics.
    pub fn describe(&self) -> Value {
        json!({
            "field_id": self.field_id,
            "type": self.kind.as_str(),
            "label": self.label,
            "parameters": self.params,
            "effective_bounds": self.bounds,
        })
    }
}

/// Contracts for every field of `form`, keyed by field id.
pub fn synthesize_contracts(form: &FormDefinition) -> BTreeMap<FieldId, FieldContract> {
    form.fields
        .iter()
        .map(|field| (field.id, FieldContract::synthesize(field)))
        .collect()
}
