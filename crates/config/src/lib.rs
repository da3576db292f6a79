//! # conductor-config
//!
//! Instance config schema, validation, and loading. The instance config
//! selects an implementation for each pluggable subsystem of a conductor
//! instance. This crate depends on `shared` only.

/// Environment variable parsing.
pub mod env;
/// Instance schema builders and typed settings.
pub mod instance;
/// Config loading helpers (YAML + overrides + validation).
pub mod load;
/// Right-biased document merge.
pub mod merge;
/// Schema grammar.
pub mod schema;
/// Document validation against a schema.
pub mod validate;
/// Loosely typed config documents.
pub mod value;

pub use env::{ENV_INSTANCE_HOME, EnvParseError, InstanceEnv};
pub use instance::{
    CONFIGURABLE_SUBSYSTEMS, ConfigurableClassData, DagitSettings, ExecutionManagerSettings,
    INSTANCE_CONFIG_FILENAME, INSTANCE_CONFIG_TYPE, InstanceConfig, build_instance_schema,
    configurable_class_field, configurable_class_schema,
};
pub use load::{
    InstanceConfigError, InvalidInstanceConfig, load_default_instance_config,
    load_instance_config, load_instance_settings, load_yaml_file, load_yaml_from_globs,
    parse_instance_config_yaml, parse_overrides_json, parse_yaml_document,
    validate_instance_document,
};
pub use merge::{merge_documents, merge_mappings};
pub use schema::{FieldSpec, NamedMapping, ScalarKind, SchemaNode};
pub use validate::{ConfigError, ConfigErrorKind, FieldPath, ValidationResult, validate};
pub use value::{ConfigMapping, ConfigValue, IntegerOutOfRange, ValueKind};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
