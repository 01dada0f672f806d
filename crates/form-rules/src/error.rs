use serde_json::{Value, json};
use thiserror::Error;

use crate::spec::FieldId;

/// Failures raised while evaluating a visibility condition.
///
/// These never escape [`crate::condition::evaluate`]; they are converted into a visible
/// outcome there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("malformed condition: {0}")]
    MalformedCondition(String),
    #[error("complex conditions cannot contain complex conditions")]
    NestedComplex,
}

/// The first failing check of a field contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("this field is required")]
    Required,
    #[error("value does not match the expected format")]
    PatternMismatch,
    #[error("only letters are allowed")]
    NotAlpha,
    #[error("only letters and numbers are allowed")]
    NotAlphaNum,
    #[error("only letters, numbers, dashes and underscores are allowed")]
    NotAlphaDash,
    #[error("must be a valid email address")]
    InvalidEmail,
    #[error("must be a valid URL")]
    InvalidUrl,
    #[error("must be a number")]
    NotANumber,
    #[error("must be a whole number")]
    NotAnInteger,
    #[error("value is too short: at least {min} characters required")]
    TooShort { min: f64 },
    #[error("value is too long: at most {max} characters allowed")]
    TooLong { max: f64 },
    #[error("must be at least {min}")]
    BelowMinimum { min: f64 },
    #[error("must be at most {max}")]
    AboveMaximum { max: f64 },
    #[error("select at least {min} options")]
    TooFewSelections { min: f64 },
    #[error("select at most {max} options")]
    TooManySelections { max: f64 },
    #[error("must start with one of: {}", .allowed.join(", "))]
    MissingPrefix { allowed: Vec<String> },
    #[error("must end with one of: {}", .allowed.join(", "))]
    MissingSuffix { allowed: Vec<String> },
    #[error("value is not one of the allowed options")]
    NotAllowed,
    #[error("upload metadata is missing or malformed")]
    InvalidFile,
    #[error("file type '{mime}' is not allowed")]
    FileTypeNotAllowed { mime: String, allowed: Vec<String> },
    #[error("file is too small: at least {min_kb} KB required")]
    FileTooSmall { min_kb: f64 },
    #[error("file is too large: at most {max_kb} KB allowed")]
    FileTooLarge { max_kb: f64 },
    #[error("video is too short: at least {min} seconds required")]
    DurationTooShort { min: f64 },
    #[error("video is too long: at most {max} seconds allowed")]
    DurationTooLong { max: f64 },
    #[error("must match field {field_id}")]
    NotSame { field_id: FieldId },
    #[error("must differ from field {field_id}")]
    NotDifferent { field_id: FieldId },
}

impl ValidationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::Required => "required",
            ValidationFailure::PatternMismatch => "pattern_mismatch",
            ValidationFailure::NotAlpha => "alpha",
            ValidationFailure::NotAlphaNum => "alpha_num",
            ValidationFailure::NotAlphaDash => "alpha_dash",
            ValidationFailure::InvalidEmail => "email",
            ValidationFailure::InvalidUrl => "url",
            ValidationFailure::NotANumber => "type_mismatch",
            ValidationFailure::NotAnInteger => "integer",
            ValidationFailure::TooShort { .. } => "min_length",
            ValidationFailure::TooLong { .. } => "max_length",
            ValidationFailure::BelowMinimum { .. } => "min",
            ValidationFailure::AboveMaximum { .. } => "max",
            ValidationFailure::TooFewSelections { .. } => "min_items",
            ValidationFailure::TooManySelections { .. } => "max_items",
            ValidationFailure::MissingPrefix { .. } => "starts_with",
            ValidationFailure::MissingSuffix { .. } => "ends_with",
            ValidationFailure::NotAllowed => "enum_mismatch",
            ValidationFailure::InvalidFile => "invalid_file",
            ValidationFailure::FileTypeNotAllowed { .. } => "mime_type",
            ValidationFailure::FileTooSmall { .. } => "min_file_size",
            ValidationFailure::FileTooLarge { .. } => "max_file_size",
            ValidationFailure::DurationTooShort { .. } => "min_duration",
            ValidationFailure::DurationTooLong { .. } => "max_duration",
            ValidationFailure::NotSame { .. } => "same",
            ValidationFailure::NotDifferent { .. } => "different",
        }
    }

    /// Rule names whose `message` template may replace the default text, most specific first.
    pub fn rule_names(&self) -> &'static [&'static str] {
        match self {
            ValidationFailure::Required => &["required"],
            ValidationFailure::PatternMismatch => &["regex"],
            ValidationFailure::NotAlpha => &["alpha"],
            ValidationFailure::NotAlphaNum => &["alpha_num"],
            ValidationFailure::NotAlphaDash => &["alpha_dash"],
            ValidationFailure::InvalidEmail => &["email"],
            ValidationFailure::InvalidUrl => &["url"],
            ValidationFailure::NotANumber => &[],
            ValidationFailure::NotAnInteger => &["integer"],
            ValidationFailure::TooShort { .. }
            | ValidationFailure::BelowMinimum { .. }
            | ValidationFailure::TooFewSelections { .. } => &["min", "between"],
            ValidationFailure::TooLong { .. }
            | ValidationFailure::AboveMaximum { .. }
            | ValidationFailure::TooManySelections { .. } => &["max", "between"],
            ValidationFailure::MissingPrefix { .. } => &["starts_with"],
            ValidationFailure::MissingSuffix { .. } => &["ends_with"],
            ValidationFailure::NotAllowed => &["in"],
            ValidationFailure::InvalidFile => &[],
            ValidationFailure::FileTypeNotAllowed { .. } => &["mimetypes", "mimes"],
            ValidationFailure::FileTooSmall { .. } => &["min_file_size"],
            ValidationFailure::FileTooLarge { .. } => &["max_file_size"],
            ValidationFailure::DurationTooShort { .. } => &["min_duration"],
            ValidationFailure::DurationTooLong { .. } => &["max_duration"],
            ValidationFailure::NotSame { .. } => &["same"],
            ValidationFailure::NotDifferent { .. } => &["different"],
        }
    }

    /// Parameters exposed to message templates.
    pub fn template_params(&self) -> Value {
        match self {
            ValidationFailure::TooShort { min }
            | ValidationFailure::BelowMinimum { min }
            | ValidationFailure::TooFewSelections { min }
            | ValidationFailure::DurationTooShort { min } => json!({ "min": number(*min) }),
            ValidationFailure::TooLong { max }
            | ValidationFailure::AboveMaximum { max }
            | ValidationFailure::TooManySelections { max }
            | ValidationFailure::DurationTooLong { max } => json!({ "max": number(*max) }),
            ValidationFailure::MissingPrefix { allowed }
            | ValidationFailure::MissingSuffix { allowed } => {
                json!({ "allowed": allowed.join(", ") })
            }
            ValidationFailure::FileTypeNotAllowed { mime, allowed } => {
                json!({ "mime": mime, "allowed": allowed.join(", ") })
            }
            ValidationFailure::FileTooSmall { min_kb } => json!({ "min": number(*min_kb) }),
            ValidationFailure::FileTooLarge { max_kb } => json!({ "max": number(*max_kb) }),
            ValidationFailure::NotSame { field_id }
            | ValidationFailure::NotDifferent { field_id } => json!({ "other": field_id }),
            _ => json!({}),
        }
    }
}

/// Whole numbers render without a trailing `.0`.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
