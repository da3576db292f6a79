//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Args, Parser, Subcommand};
use commands::{
    ConfigSource, OriginIdArgs, run_config_check, run_config_schema, run_config_show,
    run_origin_id,
};
use conductor_config::INSTANCE_CONFIG_FILENAME;
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use logging::{LogFormat, init_tracing};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "conductor",
    version,
    about = "Instance config and code origin tooling",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Log format for diagnostics on stderr (filter with `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Instance config commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Code origin commands.
    Origin {
        #[command(subcommand)]
        command: OriginCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Load, merge, and validate the instance config.
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the validated instance config.
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the instance config schema.
    Schema,
}

#[derive(Debug, Subcommand)]
enum OriginCommands {
    /// Compute the content-derived id of an origin.
    Id(OriginIdArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Instance base directory (defaults to `CONDUCTOR_HOME`).
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Config filename or glob inside the base directory.
    #[arg(long, default_value = INSTANCE_CONFIG_FILENAME)]
    filename: String,
    /// Overrides mapping as JSON, merged over the file contents.
    #[arg(long)]
    overrides_json: Option<String>,
}

impl SourceArgs {
    fn as_source(&self) -> ConfigSource<'_> {
        ConfigSource {
            base_dir: self.base_dir.as_deref(),
            filename: &self.filename,
            overrides_json: self.overrides_json.as_deref(),
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    tracing::debug!(%error, "command aborted");
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Check { source } => run_config_check(mode, source.as_source()),
            ConfigCommands::Show { source } => run_config_show(mode, source.as_source()),
            ConfigCommands::Schema => run_config_schema(mode),
        },
        Commands::Origin { command } => match command {
            OriginCommands::Id(args) => run_origin_id(mode, args),
        },
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
