//! Output format helpers for CLI commands.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use clap::{Args, ValueEnum};
use conductor_config::ConfigError;
use conductor_shared::ErrorEnvelope;
use serde::Serialize;

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Suppress progress output on stderr.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        let format = match args.output {
            Some(value) => value,
            None => OutputFormat::Text,
        };
        Self {
            format,
            no_progress: args.no_progress,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

/// Push an `info:` line onto captured stderr unless progress is suppressed.
pub fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

/// Render a library error (plus any validation errors) as command output.
pub fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
    validation_errors: &[ConfigError],
) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_json() {
        format_error_json(error, validation_errors)
    } else {
        format_error_text(error, validation_errors)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn format_error_json(error: &ErrorEnvelope, validation_errors: &[ConfigError]) -> String {
    let payload = serde_json::json!({
        "status": "error",
        "error": {
            "kind": error.kind.to_string(),
            "code": error.code.to_string(),
            "message": error.message,
            "meta": error.metadata,
        },
        "errors": validation_errors,
    });

    // This is a CLI boundary, so JSON serialization errors are internal.
    to_pretty_json(&payload).unwrap_or_else(|_| {
        "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}\n".to_owned()
    })
}

fn format_error_text(error: &ErrorEnvelope, validation_errors: &[ConfigError]) -> String {
    let mut output = format!(
        "status: error\ncode: {}\nmessage: {}\n",
        error.code, error.message
    );
    if validation_errors.is_empty() {
        for (key, value) in &error.metadata {
            output.push_str(&format!("{key}: {value}\n"));
        }
        return output;
    }

    output.push_str("errors:\n");
    for validation_error in validation_errors {
        output.push_str(&format!("  - {validation_error}\n"));
    }
    output
}
