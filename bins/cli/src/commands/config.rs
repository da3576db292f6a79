//! Instance config command handlers.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, format_error_output, log_info, to_pretty_json};
use conductor_config::{
    ConfigValue, InstanceConfig, InstanceConfigError, InstanceEnv, build_instance_schema,
    load_instance_config, parse_overrides_json,
};
use conductor_shared::ErrorEnvelope;
use std::path::{Path, PathBuf};

/// Where to read the instance config from.
#[derive(Debug, Clone, Copy)]
pub struct ConfigSource<'a> {
    /// Explicit base directory; `CONDUCTOR_HOME` when absent.
    pub base_dir: Option<&'a Path>,
    /// Filename (or glob) inside the base directory.
    pub filename: &'a str,
    /// Overrides mapping as JSON text.
    pub overrides_json: Option<&'a str>,
}

struct LoadedConfig {
    base_dir: PathBuf,
    value: ConfigValue,
}

/// Validate the instance config and summarize it.
pub fn run_config_check(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    let loaded = match load(mode, source) {
        Ok(loaded) => loaded,
        Err(output) => return Ok(output),
    };
    let settings = match InstanceConfig::from_value(&loaded.value) {
        Ok(settings) => settings,
        Err(error) => return Ok(format_error_output(mode, &error, &[])),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_json() {
        let subsystems: Vec<serde_json::Value> = settings
            .configured_subsystems()
            .into_iter()
            .map(|(key, data)| {
                serde_json::json!({
                    "key": key,
                    "module": data.module,
                    "class": data.class,
                })
            })
            .collect();
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "baseDir": loaded.base_dir.to_string_lossy(),
            "filename": source.filename,
            "subsystems": subsystems,
            "maxConcurrentRuns": settings.max_concurrent_runs(),
        }))?
    } else {
        format_check_text(&loaded.base_dir, source.filename, &settings)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Print the validated instance config.
pub fn run_config_show(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    let loaded = match load(mode, source) {
        Ok(loaded) => loaded,
        Err(output) => return Ok(output),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "baseDir": loaded.base_dir.to_string_lossy(),
            "filename": source.filename,
            "config": loaded.value,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig:\n");
        out.push_str(&serde_yaml_ng::to_string(&loaded.value)?);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Print the instance config schema.
pub fn run_config_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schema = build_instance_schema();
    let stdout = if mode.is_json() {
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "schema": schema,
        }))?
    } else {
        to_pretty_json(&schema)?
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_check_text(base_dir: &Path, filename: &str, settings: &InstanceConfig) -> String {
    let subsystems: Vec<&str> = settings
        .configured_subsystems()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    let subsystems = if subsystems.is_empty() {
        "none".to_owned()
    } else {
        subsystems.join(", ")
    };
    let max_runs = settings
        .max_concurrent_runs()
        .map_or_else(|| "unset".to_owned(), |runs| runs.to_string());

    format!(
        "status: ok\nbase_dir: {}\nfilename: {filename}\nsubsystems: {subsystems}\nmax_concurrent_runs: {max_runs}\n",
        base_dir.display()
    )
}

fn load(mode: OutputMode, source: ConfigSource<'_>) -> Result<LoadedConfig, CliOutput> {
    let base_dir =
        resolve_base_dir(source.base_dir).map_err(|error| format_error_output(mode, &error, &[]))?;
    let overrides = source
        .overrides_json
        .map(parse_overrides_json)
        .transpose()
        .map_err(|error| format_error_output(mode, &error, &[]))?;

    match load_instance_config(&base_dir, source.filename, overrides.as_ref()) {
        Ok(value) => Ok(LoadedConfig { base_dir, value }),
        Err(error) => Err(config_error_output(mode, error)),
    }
}

fn resolve_base_dir(explicit: Option<&Path>) -> Result<PathBuf, ErrorEnvelope> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let env = InstanceEnv::from_std_env()?;
    Ok(env.instance_home()?.to_path_buf())
}

fn config_error_output(mode: OutputMode, error: InstanceConfigError) -> CliOutput {
    let errors = error.validation_errors().to_vec();
    let envelope = ErrorEnvelope::from(error);
    format_error_output(mode, &envelope, &errors)
}
