#![allow(missing_docs)]

pub mod condition;
pub mod contract;
pub mod error;
pub mod messages;
pub mod mime;
pub mod normalize;
pub mod operator;
pub mod rules;
pub mod schema;
pub mod spec;
pub mod validate;
pub mod values;
pub mod visibility;

pub use condition::{
    ComplexCondition, Condition, Logic, SimpleCondition, VisibilityOutcome, VisibilityReason,
    evaluate, evaluate_complex, evaluate_simple,
};
pub use contract::{FieldContract, UploadMetadata, ValidationOutcome, synthesize_contracts};
pub use error::{EvalError, ValidationFailure};
pub use mime::{MimeMatcher, mime_matches};
pub use normalize::{Normalized, is_empty, normalize};
pub use operator::Operator;
pub use rules::{
    CrossFieldKind, CrossFieldRule, FormatConstraint, RuleParameters, ValidationBounds,
    extract_rules,
};
pub use schema::generate as form_schema;
pub use spec::{
    FieldDefinition, FieldId, FieldRule, FieldType, FormDefinition, SectionDefinition,
    TransitionDefinition, VisibilityRule,
};
pub use validate::{FieldError, FormValidationReport, validate_form};
pub use values::{RuntimeFieldValue, ValueSnapshot, snapshot};
pub use visibility::{
    VisibilityMap, VisibilityReport, build_visibility_map, explain_visibility,
    resolve_visibility,
};
