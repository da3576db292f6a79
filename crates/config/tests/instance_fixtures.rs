//! Integration tests validating the YAML fixtures against the instance schema.

use conductor_config::{
    ConfigError, ConfigErrorKind, ConfigValue, FieldPath, InstanceConfig, InstanceConfigError,
    ValidationResult, ValueKind, build_instance_schema, load_yaml_file,
    parse_instance_config_yaml, validate,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(name))?)
}

fn validation_failure(name: &str) -> Result<Vec<ConfigError>, Box<dyn Error>> {
    match parse_instance_config_yaml(&read_fixture(name)?, None) {
        Err(InstanceConfigError::Invalid(invalid)) => Ok(invalid.errors),
        Err(other) => Err(other.into()),
        Ok(_) => Err(format!("{name} unexpectedly validated").into()),
    }
}

#[test]
fn full_fixture_validates_and_decodes() -> Result<(), Box<dyn Error>> {
    let value = parse_instance_config_yaml(&read_fixture("full.yaml")?, None)?;
    let config = InstanceConfig::from_value(&value)?;

    assert_eq!(config.configured_subsystems().len(), 5);
    assert_eq!(config.max_concurrent_runs(), Some(4));

    let run_storage = config
        .run_storage
        .as_ref()
        .ok_or("run_storage should be configured")?;
    assert_eq!(run_storage.class, "PostgresRunStorage");
    assert_eq!(
        run_storage
            .config
            .pointer("postgres_db.params.sslmode")
            .and_then(ConfigValue::as_str),
        Some("require")
    );
    Ok(())
}

#[test]
fn empty_fixture_validates_to_empty_tree() -> Result<(), Box<dyn Error>> {
    let document = load_yaml_file(&fixture_path("empty.yaml"))?;
    assert_eq!(document, ConfigValue::empty_mapping());

    let result = validate(&build_instance_schema(), &document);
    assert_eq!(result, ValidationResult::Success(ConfigValue::empty_mapping()));
    Ok(())
}

#[test]
fn permissive_config_accepts_arbitrary_nested_keys() -> Result<(), Box<dyn Error>> {
    let value = parse_instance_config_yaml(&read_fixture("run_storage_nested.yaml")?, None)?;
    assert_eq!(
        value.pointer("run_storage.config.unknown_key"),
        Some(&ConfigValue::Bool(true))
    );
    assert_eq!(
        value
            .pointer("run_storage.config.anything.goes")
            .map(ConfigValue::kind),
        Some(ValueKind::Sequence)
    );
    Ok(())
}

#[test]
fn missing_max_concurrent_runs_is_a_single_error() -> Result<(), Box<dyn Error>> {
    let errors = validation_failure("missing_max_runs.yaml")?;
    assert_eq!(errors.len(), 1);

    let error = errors.first().ok_or("one error expected")?;
    assert_eq!(error.kind, ConfigErrorKind::MissingRequiredField);
    assert_eq!(
        error.path,
        FieldPath::from_segments(["dagit", "execution_manager", "max_concurrent_runs"])
    );
    assert_eq!(
        error.path.to_string(),
        "dagit.execution_manager.max_concurrent_runs"
    );
    Ok(())
}

#[test]
fn unknown_top_level_key_does_not_abort_validation() -> Result<(), Box<dyn Error>> {
    let errors = validation_failure("unknown_top_level.yaml")?;
    assert_eq!(errors.len(), 1);

    let error = errors.first().ok_or("one error expected")?;
    assert_eq!(error.kind, ConfigErrorKind::UnknownField);
    assert_eq!(error.path.to_string(), "foo");
    Ok(())
}

#[test]
fn scalars_are_not_coerced() -> Result<(), Box<dyn Error>> {
    let errors = validation_failure("type_mismatch.yaml")?;
    let found: Vec<(String, ConfigErrorKind)> = errors
        .into_iter()
        .map(|error| (error.path.to_string(), error.kind))
        .collect();

    assert_eq!(
        found,
        vec![
            (
                "run_storage.module".to_owned(),
                ConfigErrorKind::TypeMismatch {
                    expected: "string",
                    actual: ValueKind::Int,
                },
            ),
            (
                "dagit.execution_manager.max_concurrent_runs".to_owned(),
                ConfigErrorKind::TypeMismatch {
                    expected: "int",
                    actual: ValueKind::String,
                },
            ),
        ]
    );
    Ok(())
}
