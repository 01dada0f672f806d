use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::FieldId;

/// Current state of one rendered field, owned by the host's state container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeFieldValue {
    #[serde(default)]
    pub value: Value,
}

impl RuntimeFieldValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl From<Value> for RuntimeFieldValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Value snapshot keyed by field identifier. JSON object keys are decimal strings.
pub type ValueSnapshot = BTreeMap<FieldId, RuntimeFieldValue>;

/// Builds a snapshot from `(field id, raw value)` pairs.
pub fn snapshot<I>(entries: I) -> ValueSnapshot
where
    I: IntoIterator<Item = (FieldId, Value)>,
{
    entries
        .into_iter()
        .map(|(id, value)| (id, RuntimeFieldValue::new(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_deserializes_string_keys() {
        let values: ValueSnapshot =
            serde_json::from_value(json!({ "5": { "value": "yes" }, "7": {} })).expect("snapshot");
        assert_eq!(values[&5].value, json!("yes"));
        assert_eq!(values[&7].value, Value::Null);
    }
}
