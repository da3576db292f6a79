//! Repository and pipeline origins.
//!
//! An origin records where a set of pipelines lives: which interpreter loads
//! the code, what the code pointer is, and optionally which container image
//! and entry point launch it. Origins are immutable, compare structurally,
//! and derive a content-addressed id that is stable across processes.

use crate::code_pointer::CodePointer;
use crate::entry_point::{EntryPoint, EntryPointConfig};
use conductor_shared::{
    InvalidArgument, SnapshotError, SnapshotId, SnapshotRecord, create_snapshot_id,
    deserialize_record, require_non_empty, serialize_record,
};
use serde::{Deserialize, Serialize};

/// Location of a repository of pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RepositoryOriginRepr")]
pub struct RepositoryOrigin {
    executable_path: String,
    code_pointer: CodePointer,
    container_image: Option<String>,
    entry_point: Option<EntryPoint>,
}

impl RepositoryOrigin {
    /// Build an origin, checking every field.
    pub fn new(
        executable_path: impl Into<String>,
        code_pointer: CodePointer,
        container_image: Option<String>,
        entry_point: Option<EntryPoint>,
    ) -> Result<Self, InvalidArgument> {
        let executable_path = executable_path.into();
        require_non_empty("executable_path", &executable_path)?;
        code_pointer.check()?;

        Ok(Self {
            executable_path,
            code_pointer,
            container_image,
            entry_point,
        })
    }

    /// Origin for code loaded by the interpreter at `executable_path`, with
    /// the entry point derived from `entry_points`.
    pub fn for_interpreter(
        executable_path: impl Into<String>,
        code_pointer: CodePointer,
        entry_points: &EntryPointConfig,
    ) -> Result<Self, InvalidArgument> {
        let executable_path = executable_path.into();
        let entry_point = entry_points.for_executable(&executable_path);
        Self::new(executable_path, code_pointer, None, Some(entry_point))
    }

    /// Interpreter that loads the code.
    #[must_use]
    pub fn executable_path(&self) -> &str {
        &self.executable_path
    }

    /// Where the code lives.
    #[must_use]
    pub const fn code_pointer(&self) -> &CodePointer {
        &self.code_pointer
    }

    /// Container image, if any.
    #[must_use]
    pub fn container_image(&self) -> Option<&str> {
        self.container_image.as_deref()
    }

    /// Entry point as recorded (unset stays unset).
    #[must_use]
    pub const fn entry_point(&self) -> Option<&EntryPoint> {
        self.entry_point.as_ref()
    }

    /// Entry point to launch with: the recorded one, or the interpreter
    /// default from `entry_points`.
    #[must_use]
    pub fn effective_entry_point(&self, entry_points: &EntryPointConfig) -> EntryPoint {
        self.entry_point
            .clone()
            .unwrap_or_else(|| entry_points.for_executable(&self.executable_path))
    }

    /// Content-addressed id.
    pub fn id(&self) -> Result<SnapshotId, SnapshotError> {
        create_snapshot_id(self)
    }

    /// Origin of the pipeline named `pipeline_name` in this repository.
    pub fn pipeline_origin(
        &self,
        pipeline_name: impl Into<String>,
    ) -> Result<PipelineOrigin, InvalidArgument> {
        PipelineOrigin::new(pipeline_name, self.clone())
    }

    /// Canonical payload for handing the origin to another process.
    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        serialize_record(self)
    }

    /// Rebuild an origin from [`RepositoryOrigin::to_snapshot`] output.
    pub fn from_snapshot(payload: &str) -> Result<Self, SnapshotError> {
        deserialize_record(payload)
    }
}

impl SnapshotRecord for RepositoryOrigin {
    const RECORD_NAME: &'static str = "RepositoryOrigin";
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RepositoryOriginRepr {
    executable_path: String,
    code_pointer: CodePointer,
    #[serde(default)]
    container_image: Option<String>,
    #[serde(default)]
    entry_point: Option<EntryPoint>,
}

impl TryFrom<RepositoryOriginRepr> for RepositoryOrigin {
    type Error = InvalidArgument;

    fn try_from(repr: RepositoryOriginRepr) -> Result<Self, Self::Error> {
        Self::new(
            repr.executable_path,
            repr.code_pointer,
            repr.container_image,
            repr.entry_point,
        )
    }
}

/// Location of one pipeline: its name plus the repository holding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PipelineOriginRepr")]
pub struct PipelineOrigin {
    pipeline_name: String,
    repository_origin: RepositoryOrigin,
}

impl PipelineOrigin {
    /// Build a pipeline origin; the name must be non-empty.
    pub fn new(
        pipeline_name: impl Into<String>,
        repository_origin: RepositoryOrigin,
    ) -> Result<Self, InvalidArgument> {
        let pipeline_name = pipeline_name.into();
        require_non_empty("pipeline_name", &pipeline_name)?;
        Ok(Self {
            pipeline_name,
            repository_origin,
        })
    }

    /// Pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Repository holding the pipeline.
    #[must_use]
    pub const fn repository_origin(&self) -> &RepositoryOrigin {
        &self.repository_origin
    }

    /// The repository's interpreter.
    #[must_use]
    pub fn executable_path(&self) -> &str {
        self.repository_origin.executable_path()
    }

    /// The repository's code pointer.
    #[must_use]
    pub const fn code_pointer(&self) -> &CodePointer {
        self.repository_origin.code_pointer()
    }

    /// Content-addressed id.
    pub fn id(&self) -> Result<SnapshotId, SnapshotError> {
        create_snapshot_id(self)
    }

    /// Canonical payload for handing the origin to another process.
    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        serialize_record(self)
    }

    /// Rebuild an origin from [`PipelineOrigin::to_snapshot`] output.
    pub fn from_snapshot(payload: &str) -> Result<Self, SnapshotError> {
        deserialize_record(payload)
    }
}

impl SnapshotRecord for PipelineOrigin {
    const RECORD_NAME: &'static str = "PipelineOrigin";
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineOriginRepr {
    pipeline_name: String,
    repository_origin: RepositoryOrigin,
}

impl TryFrom<PipelineOriginRepr> for PipelineOrigin {
    type Error = InvalidArgument;

    fn try_from(repr: PipelineOriginRepr) -> Result<Self, Self::Error> {
        Self::new(repr.pipeline_name, repr.repository_origin)
    }
}
