use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One declarative constraint attached to a field, e.g. `between {min: 5, max: 20}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRule {
    #[serde(alias = "ruleName")]
    pub rule_name: String,
    #[serde(
        default,
        alias = "ruleProps",
        deserialize_with = "props_or_empty",
        skip_serializing_if = "Map::is_empty"
    )]
    #[schemars(with = "Map<String, Value>")]
    pub rule_props: Map<String, Value>,
}

impl FieldRule {
    pub fn new(rule_name: impl Into<String>, rule_props: Value) -> Self {
        let rule_props = match rule_props {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            rule_name: rule_name.into(),
            rule_props,
        }
    }
}

fn props_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

/// Visibility clause attached to a field, section, or transition.
///
/// `show_when` is kept as raw JSON: its shape is only checked when it is evaluated, so a
/// malformed clause degrades to "visible" instead of rejecting the whole form definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VisibilityRule {
    #[serde(default, alias = "showWhen", skip_serializing_if = "Option::is_none")]
    pub show_when: Option<Value>,
}

impl VisibilityRule {
    pub fn when(condition: Value) -> Self {
        Self {
            show_when: Some(condition),
        }
    }
}
