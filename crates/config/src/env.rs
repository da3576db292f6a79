//! Environment variable parsing for instance bootstrapping.
//!
//! Parsing is strict: a variable that is set must hold a usable value, and
//! only an unset variable falls back to `None`.

use conductor_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Env var: instance base directory.
pub const ENV_INSTANCE_HOME: &str = "CONDUCTOR_HOME";

/// Variables read by [`InstanceEnv::from_std_env`].
const KNOWN_VARS: [&str; 1] = [ENV_INSTANCE_HOME];

/// Parsed environment for locating an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceEnv {
    /// Absolute instance base directory, when `CONDUCTOR_HOME` is set.
    pub home: Option<PathBuf>,
}

impl InstanceEnv {
    /// Parse from an explicit variable map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            home: parse_optional_absolute_path(map, ENV_INSTANCE_HOME)?,
        })
    }

    /// Parse from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in KNOWN_VARS {
            if let Some(value) = std::env::var_os(name) {
                map.insert(name.to_owned(), value.to_string_lossy().into_owned());
            }
        }
        Self::from_map(&map)
    }

    /// The instance base directory, failing when it is not configured.
    pub fn instance_home(&self) -> Result<&Path, EnvParseError> {
        self.home.as_deref().ok_or(EnvParseError::Missing {
            var: ENV_INSTANCE_HOME,
        })
    }
}

/// Env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// Required env var is not set.
    Missing {
        /// Env var name.
        var: &'static str,
    },
    /// Env var was set to an empty string.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Env var must hold an absolute path.
    RelativePath {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Missing { .. } => ErrorCode::new("config", "missing_env"),
            Self::EmptyValue { .. } | Self::RelativePath { .. } => {
                ErrorCode::new("config", "invalid_env")
            },
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { var } => {
                write!(formatter, "{var} is not set; pass a base directory explicitly")
            },
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::RelativePath { var, .. } => write!(formatter, "{var} must be an absolute path"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::Missing { var } | EnvParseError::EmptyValue { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::RelativePath { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
        }
    }
}

fn parse_optional_absolute_path(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<PathBuf>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    let path = PathBuf::from(trimmed);
    if !path.is_absolute() {
        return Err(EnvParseError::RelativePath {
            var,
            value: trimmed.to_owned(),
        });
    }
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn env_with(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ENV_INSTANCE_HOME.to_owned(), value.to_owned())])
    }

    #[test]
    fn unset_home_parses_to_none() -> Result<(), Box<dyn Error>> {
        let env = InstanceEnv::from_map(&BTreeMap::new())?;
        assert_eq!(env, InstanceEnv::default());
        assert_eq!(
            env.instance_home(),
            Err(EnvParseError::Missing {
                var: ENV_INSTANCE_HOME
            })
        );
        Ok(())
    }

    #[test]
    fn absolute_home_is_trimmed_and_kept() -> Result<(), Box<dyn Error>> {
        let root = std::env::temp_dir();
        let raw = format!("  {}  ", root.display());
        let env = InstanceEnv::from_map(&env_with(&raw))?;
        assert_eq!(env.instance_home()?, root.as_path());
        Ok(())
    }

    #[test]
    fn blank_and_relative_homes_are_rejected() {
        assert_eq!(
            InstanceEnv::from_map(&env_with("   ")),
            Err(EnvParseError::EmptyValue {
                var: ENV_INSTANCE_HOME
            })
        );
        assert!(matches!(
            InstanceEnv::from_map(&env_with("relative/home")),
            Err(EnvParseError::RelativePath { .. })
        ));
    }

    #[test]
    fn env_errors_map_to_config_codes() {
        let missing = ErrorEnvelope::from(EnvParseError::Missing {
            var: ENV_INSTANCE_HOME,
        });
        assert_eq!(missing.code, ErrorCode::new("config", "missing_env"));
        assert_eq!(
            missing.metadata.get("env_var").map(String::as_str),
            Some(ENV_INSTANCE_HOME)
        );

        let relative = ErrorEnvelope::from(EnvParseError::RelativePath {
            var: ENV_INSTANCE_HOME,
            value: "rel".to_owned(),
        });
        assert_eq!(relative.code, ErrorCode::new("config", "invalid_env"));
        assert_eq!(relative.metadata.get("value").map(String::as_str), Some("rel"));
    }
}
