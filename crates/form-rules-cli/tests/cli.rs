use assert_cmd::Command;
use assert_fs::prelude::*;
use serde_json::Value;

const FORM: &str = include_str!("../../form-rules/tests/fixtures/onboarding_form.json");

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

#[test]
fn visibility_prints_map() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = assert_fs::TempDir::new()?;
    let form = workspace.child("form.json");
    form.write_str(FORM)?;
    let values = workspace.child("values.json");
    let snapshot = r#"{"5": {"value": "yes"}, "1": {"value": 20}, "2": {"value": "A"}}"#;
    values.write_str(snapshot)?;

    let output = Command::cargo_bin("form-rules")?
        .arg("visibility")
        .arg("--form")
        .arg(form.path())
        .arg("--values")
        .arg(values.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let map = stdout_json(&output);
    assert_eq!(map["fields"]["6"], true);
    assert_eq!(map["sections"]["2"], true);
    assert_eq!(map["transitions"]["101"], true);
    Ok(())
}

#[test]
fn visibility_explain_reports_fail_open() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = assert_fs::TempDir::new()?;
    let form = workspace.child("form.json");
    form.write_str(FORM)?;
    let values = workspace.child("values.json");
    values.write_str(r#"{"5": {"value": "no"}}"#)?;

    let output = Command::cargo_bin("form-rules")?
        .args(["visibility", "--explain", "--form"])
        .arg(form.path())
        .arg("--values")
        .arg(values.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let report = stdout_json(&output);
    assert_eq!(report["transitions"]["101"]["reason"]["kind"], "fail_open");
    assert_eq!(report["fields"]["6"]["is_visible"], false);
    Ok(())
}

#[test]
fn visibility_rejects_unreadable_values() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = assert_fs::TempDir::new()?;
    let form = workspace.child("form.json");
    form.write_str(FORM)?;
    let values = workspace.child("values.json");
    values.write_str("not json")?;

    let output = Command::cargo_bin("form-rules")?
        .arg("visibility")
        .arg("--form")
        .arg(form.path())
        .arg("--values")
        .arg(values.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("failed to parse values"));
    Ok(())
}

#[test]
fn validate_fails_for_invalid_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = assert_fs::TempDir::new()?;
    let form = workspace.child("form.json");
    form.write_str(FORM)?;
    let values = workspace.child("values.json");
    values.write_str(r#"{"1": {"value": 5}, "3": {"value": "ab"}}"#)?;

    let output = Command::cargo_bin("form-rules")?
        .arg("validate")
        .arg("--form")
        .arg(form.path())
        .arg("--values")
        .arg(values.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Validation result: invalid"));
    assert!(stdout.contains("3 (Trading name) [min_length]"));
    Ok(())
}

#[test]
fn validate_succeeds_for_complete_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = tempfile::TempDir::new()?;
    let form_path = workspace.path().join("form.json");
    std::fs::write(&form_path, FORM)?;
    let values_path = workspace.path().join("values.json");
    let snapshot = r#"{"1": {"value": 5}, "3": {"value": "Acme"}}"#;
    std::fs::write(&values_path, snapshot)?;

    let output = Command::cargo_bin("form-rules")?
        .arg("validate")
        .arg("--form")
        .arg(&form_path)
        .arg("--values")
        .arg(&values_path)
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Validation result: valid"));
    Ok(())
}

#[test]
fn contracts_can_select_single_field() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = assert_fs::TempDir::new()?;
    let form = workspace.child("form.json");
    form.write_str(FORM)?;

    let output = Command::cargo_bin("form-rules")?
        .args(["contracts", "--field", "4", "--form"])
        .arg(form.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let contract = stdout_json(&output);
    assert_eq!(contract["type"], "file");
    assert_eq!(contract["parameters"]["file_size_kb"]["max"], 500.0);

    Command::cargo_bin("form-rules")?
        .args(["contracts", "--field", "77", "--form"])
        .arg(form.path())
        .assert()
        .failure();
    Ok(())
}

#[test]
fn schema_prints_json_schema() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("form-rules")?
        .arg("schema")
        .assert()
        .success()
        .get_output()
        .clone();
    let schema = stdout_json(&output);
    assert_eq!(schema["title"], "FormDefinition");
    Ok(())
}
