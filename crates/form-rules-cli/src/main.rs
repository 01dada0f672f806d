use clap::{Parser, Subcommand};
use component_form_rules::{
    explain_visibility, field_contracts, get_form_schema, visibility as component_visibility,
};
use form_rules::{FieldId, FormDefinition, FormValidationReport, ValueSnapshot, validate_form};
use serde_json::{Value, json};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form rule engine CLI",
    long_about = "Evaluates visibility conditions and validation contracts of a form \
                  definition against a value snapshot"
)]
struct Cli {
    /// Emit debug logs on stderr (overrides RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the visibility map of every field, section and transition.
    Visibility {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the value snapshot JSON (defaults to an empty snapshot).
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Include the reason behind each decision.
        #[arg(long)]
        explain: bool,
    },
    /// Validate a value snapshot against the form's field contracts.
    Validate {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the value snapshot JSON.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Print the rule parameters extracted for each field.
    Contracts {
        /// Path to the form definition JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Only print the contract of this field.
        #[arg(long, value_name = "ID")]
        field: Option<FieldId>,
    },
    /// Print the JSON schema of form definitions.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Visibility {
            form,
            values,
            explain,
        } => run_visibility(form, values, explain),
        Command::Validate { form, values } => run_validate(form, values),
        Command::Contracts { form, field } => run_contracts(form, field),
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

fn form_config(form_path: &Path) -> CliResult<String> {
    let form_json = fs::read_to_string(form_path)?;
    Ok(json!({ "form_json": form_json }).to_string())
}

fn read_values(values_path: Option<&Path>) -> CliResult<String> {
    match values_path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok("{}".into()),
    }
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn run_visibility(
    form_path: PathBuf,
    values_path: Option<PathBuf>,
    explain: bool,
) -> CliResult<()> {
    let config_json = form_config(&form_path)?;
    let values_json = read_values(values_path.as_deref())?;
    let response = if explain {
        explain_visibility(&config_json, &values_json)
    } else {
        component_visibility(&config_json, &values_json)
    };
    let map = parse_component_result(&response)?;
    println!("{}", serde_json::to_string_pretty(&map)?);
    Ok(())
}

fn run_validate(form_path: PathBuf, values_path: PathBuf) -> CliResult<()> {
    let form_json = fs::read_to_string(form_path)?;
    let form: FormDefinition = serde_json::from_str(&form_json)?;
    let values_json = fs::read_to_string(values_path)?;
    let values: ValueSnapshot = serde_json::from_str(&values_json)?;
    debug!(form = %form.id, values = values.len(), "validating snapshot");

    let report = validate_form(&form, &values);
    describe_report(&mut io::stdout().lock(), &form, &report)?;

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_report(
    out: &mut impl Write,
    form: &FormDefinition,
    report: &FormValidationReport,
) -> io::Result<()> {
    writeln!(
        out,
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    )?;
    if !report.errors.is_empty() {
        writeln!(out, "Errors:")?;
        for error in &report.errors {
            writeln!(
                out,
                "  {} [{}] - {}",
                field_name(form, error.field_id),
                error.code,
                error.message
            )?;
        }
    }
    if !report.missing_required.is_empty() {
        let missing = report
            .missing_required
            .iter()
            .map(|id| field_name(form, *id))
            .collect::<Vec<_>>();
        writeln!(out, "Missing required values: {}", missing.join(", "))?;
    }
    Ok(())
}

fn field_name(form: &FormDefinition, field_id: FieldId) -> String {
    match form.field(field_id) {
        Some(field) if !field.label.trim().is_empty() => format!("{} ({})", field_id, field.label),
        _ => field_id.to_string(),
    }
}

fn run_contracts(form_path: PathBuf, field: Option<FieldId>) -> CliResult<()> {
    let config_json = form_config(&form_path)?;
    let contracts = parse_component_result(&field_contracts(&config_json))?;
    let output = match field {
        Some(id) => contracts
            .get(id.to_string())
            .cloned()
            .ok_or_else(|| format!("field {} not found", id))?,
        None => contracts,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = parse_component_result(&get_form_schema())?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_rules::{FieldError, FieldType, FormDefinition};
    use serde_json::json;

    fn form() -> FormDefinition {
        serde_json::from_value(json!({
            "id": "tiny",
            "fields": [
                { "id": 1, "type": "text", "label": "Name" },
                { "id": 2, "type": "number" }
            ]
        }))
        .expect("form")
    }

    #[test]
    fn field_name_prefers_label() {
        let form = form();
        assert_eq!(field_name(&form, 1), "1 (Name)");
        assert_eq!(field_name(&form, 2), "2");
        assert_eq!(field_name(&form, 99), "99");
        assert_eq!(form.fields[1].kind, FieldType::Number);
    }

    #[test]
    fn component_errors_become_cli_errors() {
        let err = parse_component_result(r#"{"error":"boom"}"#).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        let ok = parse_component_result(r#"{"fields":{}}"#).expect("value");
        assert!(ok["fields"].is_object());
    }

    #[test]
    fn report_description_lists_errors_and_missing_fields() {
        let form = form();
        let report = FormValidationReport {
            valid: false,
            errors: vec![FieldError {
                field_id: 1,
                code: "required".into(),
                message: "this field is required".into(),
            }],
            missing_required: vec![1, 2],
        };
        let mut out = Vec::new();
        describe_report(&mut out, &form, &report).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "Validation result: invalid\n\
             Errors:\n  \
             1 (Name) [required] - this field is required\n\
             Missing required values: 1 (Name), 2\n"
        );
    }

    #[test]
    fn report_description_of_valid_report_is_one_line() {
        let report = FormValidationReport {
            valid: true,
            errors: vec![],
            missing_required: vec![],
        };
        let mut out = Vec::new();
        describe_report(&mut out, &form(), &report).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Validation result: valid\n"
        );
    }

    #[test]
    fn missing_values_file_defaults_to_empty_snapshot() {
        assert_eq!(read_values(None).expect("values"), "{}");
    }
}
