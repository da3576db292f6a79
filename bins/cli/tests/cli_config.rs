//! `conductor config` end-to-end tests.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn conductor(args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_conductor"))
        .args(args)
        .env_remove("CONDUCTOR_HOME")
        .env_remove("RUST_LOG")
        .output()
}

fn conductor_with_home(home: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_conductor"))
        .args(args)
        .env("CONDUCTOR_HOME", home)
        .env_remove("RUST_LOG")
        .output()
}

fn stdout_json(output: &Output) -> Result<serde_json::Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

const VALID: &str = "\
run_storage:
  module: conductor.storage.sqlite
  class: SqliteRunStorage
  config:
    base_dir: /var/lib/conductor
dagit:
  execution_manager:
    max_concurrent_runs: 2
";

#[test]
fn check_reads_config_from_conductor_home() -> Result<(), Box<dyn Error>> {
    let home = tempfile::tempdir()?;
    fs::write(home.path().join("dagster.yaml"), VALID)?;

    let output = conductor_with_home(home.path(), &["config", "check", "--no-progress"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("status: ok"));
    assert!(stdout.contains("subsystems: run_storage"));
    assert!(stdout.contains("max_concurrent_runs: 2"));
    Ok(())
}

#[test]
fn missing_home_is_invalid_input() -> Result<(), Box<dyn Error>> {
    let output = conductor(&["config", "check", "--output", "json"])?;
    assert_eq!(output.status.code(), Some(2));

    let payload = stdout_json(&output)?;
    assert_eq!(
        payload
            .pointer("/error/code")
            .and_then(serde_json::Value::as_str),
        Some("config:missing_env")
    );
    Ok(())
}

#[test]
fn show_merges_overrides_into_json_output() -> Result<(), Box<dyn Error>> {
    let home = tempfile::tempdir()?;
    fs::write(home.path().join("dagster.yaml"), VALID)?;
    let base_dir = home.path().to_string_lossy().into_owned();

    let output = conductor(&[
        "config",
        "show",
        "--base-dir",
        &base_dir,
        "--overrides-json",
        r#"{"dagit":{"execution_manager":{"max_concurrent_runs":8}}}"#,
        "--output",
        "json",
    ])?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(
        payload
            .pointer("/config/dagit/execution_manager/max_concurrent_runs")
            .and_then(serde_json::Value::as_i64),
        Some(8)
    );
    assert_eq!(
        payload
            .pointer("/config/run_storage/class")
            .and_then(serde_json::Value::as_str),
        Some("SqliteRunStorage")
    );
    Ok(())
}

#[test]
fn invalid_config_lists_every_error() -> Result<(), Box<dyn Error>> {
    let home = tempfile::tempdir()?;
    fs::write(
        home.path().join("dagster.yaml"),
        "foo: 1\nrun_storage:\n  module: 7\n",
    )?;

    let output = conductor_with_home(home.path(), &["config", "check", "--output", "json"])?;
    assert_eq!(output.status.code(), Some(2));

    let payload = stdout_json(&output)?;
    assert_eq!(
        payload
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str),
        Some("Errors whilst loading instance config at dagster.yaml.")
    );
    let reasons: Vec<&str> = payload
        .get("errors")
        .and_then(serde_json::Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.get("reason").and_then(serde_json::Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(
        reasons,
        vec!["unknown_field", "type_mismatch", "missing_required_field"]
    );
    Ok(())
}

#[test]
fn empty_home_yields_empty_config() -> Result<(), Box<dyn Error>> {
    let home = tempfile::tempdir()?;

    let output = conductor_with_home(home.path(), &["config", "show", "--output", "json"])?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(payload.get("config"), Some(&serde_json::json!({})));
    Ok(())
}

#[test]
fn schema_json_names_the_root_type() -> Result<(), Box<dyn Error>> {
    let output = conductor(&["config", "schema", "--output", "json"])?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(
        payload
            .pointer("/schema/name")
            .and_then(serde_json::Value::as_str),
        Some("DagsterInstanceConfig")
    );
    Ok(())
}
