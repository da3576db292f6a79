//! Code origin command handlers.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, format_error_output, log_info, to_pretty_json};
use clap::{ArgGroup, Args};
use conductor_origin::{
    CodePointer, EntryPoint, EntryPointConfig, PipelineOrigin, RepositoryOrigin,
};
use conductor_shared::{ErrorEnvelope, SnapshotId, SnapshotRecord};

/// Flags describing a repository (and optionally pipeline) origin.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("pointer")
        .required(true)
        .args(["module", "python_file", "package_name"])
))]
pub struct OriginIdArgs {
    /// Interpreter that loads the code.
    #[arg(long)]
    pub executable_path: String,
    /// Module holding the repository function.
    #[arg(long)]
    pub module: Option<String>,
    /// File holding the repository function.
    #[arg(long)]
    pub python_file: Option<String>,
    /// Installed package exporting the repository.
    #[arg(long)]
    pub package_name: Option<String>,
    /// Function name, for `--module` and `--python-file`.
    #[arg(long)]
    pub fn_name: Option<String>,
    /// Attribute name, for `--package-name`.
    #[arg(long)]
    pub attribute: Option<String>,
    /// Working directory to load `--python-file` from.
    #[arg(long, requires = "python_file")]
    pub working_directory: Option<String>,
    /// Container image the code runs in.
    #[arg(long)]
    pub container_image: Option<String>,
    /// Entry point argument (repeat for each argument).
    #[arg(long = "entry-point-arg", allow_hyphen_values = true)]
    pub entry_point: Vec<String>,
    /// Record the interpreter default entry point.
    #[arg(long, conflicts_with = "entry_point")]
    pub interpreter_default: bool,
    /// Driver package for default entry points.
    #[arg(long)]
    pub entry_package: Option<String>,
    /// Identify a pipeline in the repository instead of the repository.
    #[arg(long)]
    pub pipeline: Option<String>,
}

enum Target {
    Repository(RepositoryOrigin),
    Pipeline(PipelineOrigin),
}

impl Target {
    const fn record(&self) -> &'static str {
        match self {
            Self::Repository(_) => RepositoryOrigin::RECORD_NAME,
            Self::Pipeline(_) => PipelineOrigin::RECORD_NAME,
        }
    }

    const fn repository(&self) -> &RepositoryOrigin {
        match self {
            Self::Repository(origin) => origin,
            Self::Pipeline(origin) => origin.repository_origin(),
        }
    }

    fn id(&self) -> Result<SnapshotId, ErrorEnvelope> {
        let id = match self {
            Self::Repository(origin) => origin.id()?,
            Self::Pipeline(origin) => origin.id()?,
        };
        Ok(id)
    }

    fn snapshot(&self) -> Result<String, ErrorEnvelope> {
        let payload = match self {
            Self::Repository(origin) => origin.to_snapshot()?,
            Self::Pipeline(origin) => origin.to_snapshot()?,
        };
        Ok(payload)
    }
}

/// Compute the id of a repository or pipeline origin.
pub fn run_origin_id(mode: OutputMode, args: &OriginIdArgs) -> Result<CliOutput, CliError> {
    let pointer = code_pointer_from_args(args)?;
    let entry_points = match entry_point_config(args) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, &[])),
    };

    let described = build_target(args, pointer, &entry_points).and_then(|target| {
        let id = target.id()?;
        let snapshot = target.snapshot()?;
        Ok((target, id, snapshot))
    });
    let (target, id, snapshot) = match described {
        Ok(described) => described,
        Err(error) => return Ok(format_error_output(mode, &error, &[])),
    };

    let repository = target.repository();
    let launch = repository.effective_entry_point(&entry_points);

    let mut stderr = String::new();
    log_info(&mut stderr, "origin id computed", mode.no_progress);

    let stdout = if mode.is_json() {
        let snapshot_value: serde_json::Value = serde_json::from_str(&snapshot)?;
        to_pretty_json(&serde_json::json!({
            "status": "ok",
            "record": target.record(),
            "id": id.as_str(),
            "location": repository.code_pointer().describe(),
            "entryPoint": launch.args(),
            "snapshot": snapshot_value,
        }))?
    } else {
        format!(
            "status: ok\nrecord: {}\nid: {id}\nlocation: {}\nentry_point: {launch}\nsnapshot: {snapshot}\n",
            target.record(),
            repository.code_pointer(),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn code_pointer_from_args(args: &OriginIdArgs) -> Result<CodePointer, CliError> {
    let pointer = match (&args.module, &args.python_file, &args.package_name) {
        (Some(module), None, None) => {
            CodePointer::module(module.as_str(), required(args.fn_name.as_deref(), "--fn-name")?)
        },
        (None, Some(python_file), None) => CodePointer::file(
            python_file.as_str(),
            required(args.fn_name.as_deref(), "--fn-name")?,
            args.working_directory.clone(),
        ),
        (None, None, Some(package_name)) => CodePointer::package(
            package_name.as_str(),
            required(args.attribute.as_deref(), "--attribute")?,
        ),
        _ => {
            return Err(CliError::InvalidInput(
                "pass exactly one of --module, --python-file, or --package-name".to_owned(),
            ));
        },
    };
    pointer.map_err(|error| CliError::InvalidInput(error.to_string()))
}

fn required<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str, CliError> {
    value.ok_or_else(|| CliError::InvalidInput(format!("{flag} is required for this code pointer")))
}

fn entry_point_config(args: &OriginIdArgs) -> Result<EntryPointConfig, ErrorEnvelope> {
    match &args.entry_package {
        Some(package) => Ok(EntryPointConfig::new(package.as_str())?),
        None => Ok(EntryPointConfig::default()),
    }
}

fn build_target(
    args: &OriginIdArgs,
    pointer: CodePointer,
    entry_points: &EntryPointConfig,
) -> Result<Target, ErrorEnvelope> {
    let entry_point = if args.interpreter_default {
        Some(entry_points.for_executable(&args.executable_path))
    } else if args.entry_point.is_empty() {
        None
    } else {
        Some(EntryPoint::new(args.entry_point.iter().map(String::as_str)))
    };

    let repository = RepositoryOrigin::new(
        args.executable_path.as_str(),
        pointer,
        args.container_image.clone(),
        entry_point,
    )?;

    match &args.pipeline {
        Some(name) => Ok(Target::Pipeline(repository.pipeline_origin(name.as_str())?)),
        None => Ok(Target::Repository(repository)),
    }
}
