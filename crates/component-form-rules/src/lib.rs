use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_rules::{
    FieldContract, FieldId, FormDefinition, ValueSnapshot, explain_visibility as rules_explain,
    form_schema, resolve_visibility, synthesize_contracts, validate_form,
};

const DEFAULT_FORM: &str = include_str!("../../form-rules/tests/fixtures/onboarding_form.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse values: {0}")]
    ValuesParse(#[source] serde_json::Error),
    #[error("field {0} is not part of form '{1}'")]
    FieldUnavailable(FieldId, String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_json: Option<String>,
    #[serde(default)]
    form: Option<Value>,
}

/// Accepts `{"form_json": "..."}`, `{"form": {...}}`, or the form definition itself.
fn load_form(config_json: &str) -> Result<FormDefinition, ComponentError> {
    if config_json.trim().is_empty() {
        return default_form();
    }

    let raw: Value = serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?;
    let is_wrapper = raw
        .as_object()
        .is_some_and(|map| map.contains_key("form_json") || map.contains_key("form"));
    if !is_wrapper {
        return serde_json::from_value(raw).map_err(ComponentError::ConfigParse);
    }

    let config: ComponentConfig =
        serde_json::from_value(raw).map_err(ComponentError::ConfigParse)?;
    match (config.form_json, config.form) {
        (Some(form_json), _) => {
            serde_json::from_str(&form_json).map_err(ComponentError::ConfigParse)
        }
        (None, Some(form)) => serde_json::from_value(form).map_err(ComponentError::ConfigParse),
        (None, None) => default_form(),
    }
}

fn default_form() -> Result<FormDefinition, ComponentError> {
    debug!("no form supplied, using bundled onboarding form");
    serde_json::from_str(DEFAULT_FORM).map_err(ComponentError::ConfigParse)
}

fn parse_values(values_json: &str) -> Result<ValueSnapshot, ComponentError> {
    if values_json.trim().is_empty() {
        return Ok(ValueSnapshot::new());
    }
    serde_json::from_str(values_json).map_err(ComponentError::ValuesParse)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

pub fn describe(config_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| encode(&form)))
}

pub fn get_form_schema() -> String {
    respond(Ok(form_schema()))
}

pub fn visibility(config_json: &str, values_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let values = parse_values(values_json)?;
        encode(&resolve_visibility(&form, &values))
    }))
}

pub fn explain_visibility(config_json: &str, values_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let values = parse_values(values_json)?;
        encode(&rules_explain(&form, &values))
    }))
}

pub fn validate_field(config_json: &str, field_id: FieldId, value_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let field = form
            .field(field_id)
            .ok_or_else(|| ComponentError::FieldUnavailable(field_id, form.id.clone()))?;
        let value: Value = if value_json.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(value_json).map_err(ComponentError::ValuesParse)?
        };
        encode(&FieldContract::synthesize(field).validate(&value))
    }))
}

pub fn validate_values(config_json: &str, values_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let values = parse_values(values_json)?;
        encode(&validate_form(&form, &values))
    }))
}

pub fn field_contracts(config_json: &str) -> String {
    respond(load_form(config_json).map(|form| {
        let contracts = synthesize_contracts(&form)
            .into_iter()
            .map(|(id, contract)| (id.to_string(), contract.describe()))
            .collect::<Map<_, _>>();
        Value::Object(contracts)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: &str) -> Value {
        serde_json::from_str(payload).expect("json")
    }

    #[test]
    fn describe_returns_default_form() {
        let form = parse(&describe(""));
        assert_eq!(form["id"], "vendor-onboarding");
    }

    #[test]
    fn describe_accepts_wrapped_form_json() {
        let form = json!({ "id": "wrapped", "fields": [] });
        let config = json!({ "form_json": form.to_string() });
        assert_eq!(parse(&describe(&config.to_string()))["id"], "wrapped");
        let config = json!({ "form": form });
        assert_eq!(parse(&describe(&config.to_string()))["id"], "wrapped");
    }

    #[test]
    fn schema_lists_form_properties() {
        let schema = parse(&get_form_schema());
        assert!(schema["properties"]["fields"].is_object());
    }

    #[test]
    fn visibility_returns_complete_map() {
        let map = parse(&visibility("", r#"{"5": {"value": "yes"}}"#));
        assert_eq!(map["fields"]["6"], true);
        assert_eq!(map["transitions"]["100"], true);
        assert_eq!(map["sections"]["2"], false);
    }

    #[test]
    fn visibility_rejects_unreadable_values() {
        for payload in [visibility("", "not json"), explain_visibility("", "[1, 2")] {
            let error = parse(&payload);
            assert!(error.get("fields").is_none());
            assert!(
                error["error"]
                    .as_str()
                    .unwrap_or_default()
                    .starts_with("failed to parse values")
            );
        }
        let map = parse(&visibility("", "  "));
        assert_eq!(map["fields"]["6"], false);
    }

    #[test]
    fn explain_visibility_includes_reasons() {
        let report = parse(&explain_visibility("", r#"{"5": {"value": "no"}}"#));
        assert_eq!(report["transitions"]["101"]["is_visible"], true);
        assert_eq!(report["transitions"]["101"]["reason"]["kind"], "fail_open");
        assert_eq!(report["fields"]["6"]["reason"]["kind"], "not_satisfied");
    }

    #[test]
    fn validate_field_reports_first_failure() {
        let outcome = parse(&validate_field("", 3, r#""ab""#));
        assert_eq!(outcome["valid"], false);
        assert_eq!(outcome["code"], "min_length");

        let outcome = parse(&validate_field("", 3, ""));
        assert_eq!(outcome["code"], "required");

        let outcome = parse(&validate_field("", 3, r#""Acme""#));
        assert_eq!(outcome, json!({ "valid": true }));
    }

    #[test]
    fn validate_field_rejects_unknown_field() {
        let outcome = parse(&validate_field("", 404, "1"));
        assert!(
            outcome["error"]
                .as_str()
                .unwrap_or_default()
                .contains("field 404")
        );
    }

    #[test]
    fn validate_values_returns_report() {
        let report = parse(&validate_values("", r#"{"1": {"value": 5}}"#));
        assert_eq!(report["valid"], false);
        assert_eq!(report["missing_required"], json!([3]));

        let error = parse(&validate_values("", "[1, 2"));
        assert!(
            error["error"]
                .as_str()
                .unwrap_or_default()
                .starts_with("failed to parse values")
        );
    }

    #[test]
    fn field_contracts_expose_resolved_parameters() {
        let contracts = parse(&field_contracts(""));
        assert_eq!(contracts["3"]["parameters"]["required"], true);
        assert_eq!(contracts["3"]["parameters"]["bounds"]["min"], 3.0);
        assert_eq!(contracts["9"]["effective_bounds"]["max"], 100.0);
        assert_eq!(
            contracts["4"]["parameters"]["mime_types"],
            json!(["image/*"])
        );
    }

    #[test]
    fn malformed_config_is_reported() {
        let error = parse(&describe("{"));
        assert!(
            error["error"]
                .as_str()
                .unwrap_or_default()
                .starts_with("failed to parse config")
        );
    }
}
