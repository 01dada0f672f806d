use std::collections::BTreeMap;
use std::sync::LazyLock;

use handlebars::Handlebars;
use serde_json::Value;
use tracing::warn;

use crate::error::ValidationFailure;

static RENDERER: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
});

/// Per-rule message overrides declared through a rule's `message` prop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageTemplates {
    templates: BTreeMap<String, String>,
}

impl MessageTemplates {
    pub fn new(templates: BTreeMap<String, String>) -> Self {
        Self { templates }
    }

    /// Text for `failure`: the matching template if one renders, the default otherwise.
    pub fn render(&self, failure: &ValidationFailure, label: &str) -> String {
        let Some((rule, template)) = failure
            .rule_names()
            .iter()
            .find_map(|rule| self.templates.get(*rule).map(|template| (*rule, template)))
        else {
            return failure.to_string();
        };

        let mut context = failure.template_params();
        if let Value::Object(map) = &mut context {
            map.insert("label".into(), Value::String(label.to_string()));
            map.insert("default".into(), Value::String(failure.to_string()));
        }

        match RENDERER.render_template(template, &context) {
            Ok(message) => message,
            Err(err) => {
                warn!(rule, error = %err, "message template failed to render");
                failure.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(entries: &[(&str, &str)]) -> MessageTemplates {
        MessageTemplates::new(
            entries
                .iter()
                .map(|(rule, template)| (rule.to_string(), template.to_string()))
                .collect(),
        )
    }

    #[test]
    fn default_text_without_template() {
        let messages = MessageTemplates::default();
        assert_eq!(
            messages.render(&ValidationFailure::Required, "Name"),
            "this field is required"
        );
    }

    #[test]
    fn template_receives_label_and_params() {
        let messages = templates(&[("min", "{{label}} needs {{min}}+ characters")]);
        assert_eq!(
            messages.render(&ValidationFailure::TooShort { min: 3.0 }, "Nickname"),
            "Nickname needs 3+ characters"
        );
    }

    #[test]
    fn between_template_covers_both_bounds() {
        let messages = templates(&[("between", "between {{min}}{{max}} & co")]);
        assert_eq!(
            messages.render(&ValidationFailure::AboveMaximum { max: 20.0 }, ""),
            "between 20 & co"
        );
    }

    #[test]
    fn broken_template_falls_back() {
        let messages = templates(&[("required", "{{#if}}")]);
        assert_eq!(
            messages.render(&ValidationFailure::Required, "Name"),
            "this field is required"
        );
    }
}
