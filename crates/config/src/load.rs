//! Config loading helpers (YAML files + overrides + validation).
//!
//! The loader merges documents in a deterministic order and reports failures
//! as typed errors that convert into `ErrorEnvelope`s at the boundary.

use crate::instance::{INSTANCE_CONFIG_FILENAME, InstanceConfig, build_instance_schema};
use crate::merge::merge_documents;
use crate::validate::{ConfigError, ValidationResult, validate};
use crate::value::{ConfigValue, IntegerOutOfRange};
use conductor_shared::{ErrorCode, ErrorEnvelope};
use glob::Pattern;
use std::fmt;
use std::path::{Path, PathBuf};

/// Source label used when a document did not come from disk.
pub const IN_MEMORY_SOURCE: &str = "<string>";

/// Load every file matched by `patterns` and merge them in order.
///
/// Matches of one pattern are sorted before loading. A pattern with no match
/// contributes nothing, so no match at all yields an empty mapping.
pub fn load_yaml_from_globs<I, S>(patterns: I) -> Result<ConfigValue, ErrorEnvelope>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = ConfigValue::empty_mapping();
    for pattern in patterns {
        for path in expand_glob(pattern.as_ref())? {
            let document = load_yaml_file(&path)?;
            merged = merge_documents(&merged, &document);
        }
    }
    Ok(merged)
}

/// Read and parse a single YAML file.
pub fn load_yaml_file(path: &Path) -> Result<ConfigValue, ErrorEnvelope> {
    let text = std::fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded yaml file");
    parse_yaml_document(&text, &path.to_string_lossy())
}

/// Parse YAML text whose top level must be a mapping.
///
/// An empty document (blank or comments only) is an empty mapping.
pub fn parse_yaml_document(text: &str, source: &str) -> Result<ConfigValue, ErrorEnvelope> {
    if text.lines().all(is_blank_or_comment) {
        return Ok(ConfigValue::empty_mapping());
    }

    let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(text).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_yaml"),
            format!("invalid config YAML: {error}"),
        )
        .with_metadata("source", source)
    })?;

    let document =
        ConfigValue::try_from(yaml).map_err(|error| integer_out_of_range(source, &error))?;
    match document {
        ConfigValue::Null => Ok(ConfigValue::empty_mapping()),
        document @ ConfigValue::Mapping(_) => Ok(document),
        other => Err(not_a_mapping(source, &other)),
    }
}

/// Parse an overrides blob given as JSON; it must be an object.
pub fn parse_overrides_json(text: &str) -> Result<ConfigValue, ErrorEnvelope> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })?;
    let overrides =
        ConfigValue::try_from(json).map_err(|error| integer_out_of_range("overrides", &error))?;
    check_overrides(&overrides)?;
    Ok(overrides)
}

/// Validation of an instance config failed; carries every error found.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidInstanceConfig {
    /// Summary message naming the config file.
    pub message: String,
    /// Config filename (or source label) that was validated.
    pub filename: String,
    /// Every validation error, in walk order.
    pub errors: Vec<ConfigError>,
    /// The merged document that failed validation.
    pub document: ConfigValue,
}

impl InvalidInstanceConfig {
    fn new(filename: &str, errors: Vec<ConfigError>, document: ConfigValue) -> Self {
        Self {
            message: format!("Errors whilst loading instance config at {filename}."),
            filename: filename.to_owned(),
            errors,
            document,
        }
    }
}

impl fmt::Display for InvalidInstanceConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)?;
        for error in &self.errors {
            write!(formatter, "\n    {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidInstanceConfig {}

impl From<InvalidInstanceConfig> for ErrorEnvelope {
    fn from(error: InvalidInstanceConfig) -> Self {
        let errors = error
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self::expected(
            ErrorCode::new("config", "invalid_instance_config"),
            error.message,
        )
        .with_metadata("filename", error.filename)
        .with_metadata("error_count", error.errors.len().to_string())
        .with_metadata("errors", errors)
    }
}

/// Failure to produce a validated instance config.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceConfigError {
    /// Reading or parsing an input failed.
    Load(ErrorEnvelope),
    /// The merged document did not match the instance schema.
    Invalid(InvalidInstanceConfig),
}

impl InstanceConfigError {
    /// Validation errors, when this is a validation failure.
    #[must_use]
    pub fn validation_errors(&self) -> &[ConfigError] {
        match self {
            Self::Load(_) => &[],
            Self::Invalid(invalid) => &invalid.errors,
        }
    }
}

impl fmt::Display for InstanceConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(envelope) => write!(formatter, "{envelope}"),
            Self::Invalid(invalid) => write!(formatter, "{invalid}"),
        }
    }
}

impl std::error::Error for InstanceConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(envelope) => Some(envelope),
            Self::Invalid(invalid) => Some(invalid),
        }
    }
}

impl From<ErrorEnvelope> for InstanceConfigError {
    fn from(error: ErrorEnvelope) -> Self {
        Self::Load(error)
    }
}

impl From<InvalidInstanceConfig> for InstanceConfigError {
    fn from(error: InvalidInstanceConfig) -> Self {
        Self::Invalid(error)
    }
}

impl From<InstanceConfigError> for ErrorEnvelope {
    fn from(error: InstanceConfigError) -> Self {
        match error {
            InstanceConfigError::Load(envelope) => envelope,
            InstanceConfigError::Invalid(invalid) => invalid.into(),
        }
    }
}

/// Load `<base_dir>/<config_filename>`, merge `overrides` on top, and
/// validate the result against the instance schema.
///
/// `config_filename` may itself be a glob; `base_dir` is matched literally.
/// A missing file behaves like an empty one.
pub fn load_instance_config(
    base_dir: &Path,
    config_filename: &str,
    overrides: Option<&ConfigValue>,
) -> Result<ConfigValue, InstanceConfigError> {
    if let Some(overrides) = overrides {
        check_overrides(overrides)?;
    }

    let pattern = instance_config_pattern(base_dir, config_filename);
    let loaded = load_yaml_from_globs([pattern.as_str()])?;
    let document = apply_overrides(&loaded, overrides);

    let value = validate_instance_document(document, config_filename)?;
    tracing::info!(
        base_dir = %base_dir.display(),
        filename = config_filename,
        "instance config loaded"
    );
    Ok(value)
}

/// [`load_instance_config`] with the conventional filename.
pub fn load_default_instance_config(
    base_dir: &Path,
    overrides: Option<&ConfigValue>,
) -> Result<ConfigValue, InstanceConfigError> {
    load_instance_config(base_dir, INSTANCE_CONFIG_FILENAME, overrides)
}

/// Like [`load_instance_config`], decoding the result into typed settings.
pub fn load_instance_settings(
    base_dir: &Path,
    config_filename: &str,
    overrides: Option<&ConfigValue>,
) -> Result<InstanceConfig, InstanceConfigError> {
    let value = load_instance_config(base_dir, config_filename, overrides)?;
    Ok(InstanceConfig::from_value(&value)?)
}

/// Validate instance config YAML held in memory.
pub fn parse_instance_config_yaml(
    text: &str,
    overrides: Option<&ConfigValue>,
) -> Result<ConfigValue, InstanceConfigError> {
    if let Some(overrides) = overrides {
        check_overrides(overrides)?;
    }

    let loaded = parse_yaml_document(text, IN_MEMORY_SOURCE)?;
    let document = apply_overrides(&loaded, overrides);
    Ok(validate_instance_document(document, IN_MEMORY_SOURCE)?)
}

/// Validate a merged document against a freshly built instance schema.
pub fn validate_instance_document(
    document: ConfigValue,
    filename: &str,
) -> Result<ConfigValue, InvalidInstanceConfig> {
    let schema = build_instance_schema();
    tracing::debug!(filename, "validating instance config");

    match validate(&schema, &document) {
        ValidationResult::Success(value) => Ok(value),
        ValidationResult::Failure(errors) => {
            tracing::warn!(
                filename,
                error_count = errors.len(),
                "instance config failed validation"
            );
            Err(InvalidInstanceConfig::new(filename, errors, document))
        },
    }
}

fn apply_overrides(loaded: &ConfigValue, overrides: Option<&ConfigValue>) -> ConfigValue {
    overrides.map_or_else(
        || loaded.clone(),
        |overrides| merge_documents(loaded, overrides),
    )
}

fn check_overrides(overrides: &ConfigValue) -> Result<(), ErrorEnvelope> {
    if overrides.as_mapping().is_some() {
        return Ok(());
    }
    Err(ErrorEnvelope::expected(
        ErrorCode::invalid_argument(),
        "overrides must be a mapping",
    )
    .with_metadata("field", "overrides")
    .with_metadata("actual", overrides.kind().as_str()))
}

fn instance_config_pattern(base_dir: &Path, config_filename: &str) -> String {
    let escaped = Pattern::escape(&base_dir.to_string_lossy());
    Path::new(&escaped)
        .join(config_filename)
        .to_string_lossy()
        .into_owned()
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, ErrorEnvelope> {
    let entries = glob::glob(pattern).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_glob"),
            format!("invalid glob pattern: {error}"),
        )
        .with_metadata("pattern", pattern)
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|error| {
            let path = error.path().to_string_lossy().to_string();
            ErrorEnvelope::from(std::io::Error::from(error)).with_metadata("path", path)
        })?;
        paths.push(path);
    }
    paths.sort();

    if paths.is_empty() {
        tracing::debug!(pattern, "glob matched no files");
    }
    Ok(paths)
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

fn integer_out_of_range(source: &str, error: &IntegerOutOfRange) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("config", "integer_out_of_range"),
        error.to_string(),
    )
    .with_metadata("source", source)
    .with_metadata("literal", error.literal.as_str())
}

fn not_a_mapping(source: &str, document: &ConfigValue) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("config", "not_a_mapping"),
        format!(
            "config document must be a mapping, found {}",
            document.kind()
        ),
    )
    .with_metadata("source", source)
}
