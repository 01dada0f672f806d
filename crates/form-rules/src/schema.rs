use serde_json::Value;

use crate::spec::FormDefinition;

/// JSON schema of the form definition document.
pub fn generate() -> Value {
    serde_json::to_value(schemars::schema_for!(FormDefinition)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_fields() {
        let schema = generate();
        let properties = schema["properties"].as_object().expect("properties");
        assert!(properties.contains_key("fields"));
        assert!(properties.contains_key("sections"));
        let required = schema["required"].as_array().expect("required");
        assert!(required.iter().any(|entry| entry == "id"));
    }
}
