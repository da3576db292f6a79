//! Instance config schema and typed settings.
//!
//! The instance config (`dagster.yaml` by convention) selects an
//! implementation for each pluggable subsystem and carries UI execution
//! settings:
//!
//! ```yaml
//! run_storage:
//!   module: conductor.storage.sqlite
//!   class: SqliteRunStorage
//!   config:
//!     base_dir: /var/lib/conductor
//! dagit:
//!   execution_manager:
//!     max_concurrent_runs: 4
//! ```

use crate::schema::{FieldSpec, NamedMapping, SchemaNode};
use crate::value::{ConfigMapping, ConfigValue};
use conductor_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};

/// Conventional instance config filename.
pub const INSTANCE_CONFIG_FILENAME: &str = "dagster.yaml";

/// Type name of the root schema.
pub const INSTANCE_CONFIG_TYPE: &str = "DagsterInstanceConfig";

/// Top-level key: local artifact storage.
pub const LOCAL_ARTIFACT_STORAGE: &str = "local_artifact_storage";
/// Top-level key: compute log manager.
pub const COMPUTE_LOGS: &str = "compute_logs";
/// Top-level key: run storage.
pub const RUN_STORAGE: &str = "run_storage";
/// Top-level key: event log storage.
pub const EVENT_LOG_STORAGE: &str = "event_log_storage";
/// Top-level key: run launcher.
pub const RUN_LAUNCHER: &str = "run_launcher";
/// Top-level key: UI settings.
pub const DAGIT: &str = "dagit";

/// The five pluggable subsystems, with the type name of each fragment.
pub const CONFIGURABLE_SUBSYSTEMS: [(&str, &str); 5] = [
    (
        LOCAL_ARTIFACT_STORAGE,
        "DagsterInstanceLocalArtifactStorageConfig",
    ),
    (COMPUTE_LOGS, "DagsterInstanceComputeLogsConfig"),
    (RUN_STORAGE, "DagsterInstanceRunStorageConfig"),
    (EVENT_LOG_STORAGE, "DagsterInstanceEventLogStorageConfig"),
    (RUN_LAUNCHER, "DagsterInstanceRunLauncherConfig"),
];

/// Schema fragment for a pluggable class: `{module, class, config}`.
#[must_use]
pub fn configurable_class_schema(name: &str) -> NamedMapping {
    NamedMapping::new(name)
        .field("module", FieldSpec::required(SchemaNode::string()))
        .field("class", FieldSpec::required(SchemaNode::string()))
        .field("config", FieldSpec::optional(SchemaNode::Permissive))
}

/// Field holding a [`configurable_class_schema`] fragment.
#[must_use]
pub fn configurable_class_field(name: &str, optional: bool) -> FieldSpec {
    FieldSpec::new(configurable_class_schema(name), optional)
}

/// Build the root schema for the instance config.
///
/// Every top-level field is optional. `dagit.execution_manager` is optional,
/// but once present it must carry an integer `max_concurrent_runs`.
#[must_use]
pub fn build_instance_schema() -> SchemaNode {
    let execution_manager = NamedMapping::new("DagitSettingsExecutionManager")
        .field("max_concurrent_runs", FieldSpec::required(SchemaNode::int()));
    let dagit = NamedMapping::new("DagitSettings")
        .field("execution_manager", FieldSpec::optional(execution_manager));

    let root = CONFIGURABLE_SUBSYSTEMS.iter().fold(
        NamedMapping::new(INSTANCE_CONFIG_TYPE),
        |root, (key, type_name)| root.field(*key, configurable_class_field(type_name, true)),
    );

    SchemaNode::NamedMapping(root.field(DAGIT, FieldSpec::optional(dagit)))
}

/// Module/class/config triple selecting a pluggable implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurableClassData {
    /// Module to load the class from.
    pub module: String,
    /// Class name within the module.
    pub class: String,
    /// Opaque config handed to the class.
    #[serde(default = "ConfigValue::empty_mapping")]
    pub config: ConfigValue,
}

impl ConfigurableClassData {
    /// The config block as a mapping (empty when it is not one).
    #[must_use]
    pub fn config_mapping(&self) -> ConfigMapping {
        self.config.as_mapping().cloned().unwrap_or_default()
    }
}

/// Concurrency settings for runs launched from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionManagerSettings {
    /// Maximum number of runs executing at once.
    pub max_concurrent_runs: i64,
}

/// UI settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DagitSettings {
    /// Optional execution manager block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_manager: Option<ExecutionManagerSettings>,
}

/// Typed view of a validated instance config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    /// Local artifact storage implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_artifact_storage: Option<ConfigurableClassData>,
    /// Compute log manager implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_logs: Option<ConfigurableClassData>,
    /// Run storage implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_storage: Option<ConfigurableClassData>,
    /// Event log storage implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_log_storage: Option<ConfigurableClassData>,
    /// Run launcher implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_launcher: Option<ConfigurableClassData>,
    /// UI settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dagit: Option<DagitSettings>,
}

impl InstanceConfig {
    /// Decode a value tree produced by validating against
    /// [`build_instance_schema`].
    ///
    /// Decoding goes through the YAML value model, which keeps non-finite
    /// floats inside permissive `config` blocks.
    pub fn from_value(value: &ConfigValue) -> Result<Self, ErrorEnvelope> {
        serde_yaml_ng::to_value(value)
            .and_then(serde_yaml_ng::from_value)
            .map_err(|error| {
                ErrorEnvelope::invariant(
                    ErrorCode::internal(),
                    format!("validated instance config did not decode: {error}"),
                )
                .with_metadata("type", INSTANCE_CONFIG_TYPE)
            })
    }

    /// Configured subsystems as `(key, data)` pairs, in schema order.
    #[must_use]
    pub fn configured_subsystems(&self) -> Vec<(&'static str, &ConfigurableClassData)> {
        [
            (LOCAL_ARTIFACT_STORAGE, self.local_artifact_storage.as_ref()),
            (COMPUTE_LOGS, self.compute_logs.as_ref()),
            (RUN_STORAGE, self.run_storage.as_ref()),
            (EVENT_LOG_STORAGE, self.event_log_storage.as_ref()),
            (RUN_LAUNCHER, self.run_launcher.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, data)| data.map(|data| (key, data)))
        .collect()
    }

    /// `dagit.execution_manager.max_concurrent_runs`, when configured.
    #[must_use]
    pub fn max_concurrent_runs(&self) -> Option<i64> {
        self.dagit
            .and_then(|dagit| dagit.execution_manager)
            .map(|manager| manager.max_concurrent_runs)
    }
}
