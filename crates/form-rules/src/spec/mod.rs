pub mod field;
pub mod form;
pub mod rule;

pub use field::{FieldDefinition, FieldId, FieldType};
pub use form::{FormDefinition, SectionDefinition, SectionId, TransitionDefinition, TransitionId};
pub use rule::{FieldRule, VisibilityRule};
