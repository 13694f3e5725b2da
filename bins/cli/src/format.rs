//! Output format helpers for CLI commands.

use crate::CliOutput;
use crate::error::{CliError, ExitCode, exit_code_for};
use clap::{Args, ValueEnum};
use index_config_shared::{ErrorEnvelope, REDACTED_VALUE, is_secret_key};
use serde::Serialize;

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    #[default]
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    /// Emit use-case events and HTTP diagnostics on stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub verbose: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output,
            verbose: args.verbose,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json_line<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

/// Successful output with an empty stderr.
pub const fn ok_output(stdout: String) -> CliOutput {
    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    }
}

/// Render a failure, with secret metadata values redacted.
pub fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let error = sanitize_error(error.clone());
    let exit_code = exit_code_for(&error);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });
        // Serialization failures at the boundary are internal.
        to_json_line(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":{\"namespace\":\"core\",\"code\":\"internal\"}}}\n"
                .to_string()
        })
    } else {
        format_error_text(&error)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

fn sanitize_error(mut error: ErrorEnvelope) -> ErrorEnvelope {
    for (key, value) in &mut error.metadata {
        if is_secret_key(key) {
            *value = REDACTED_VALUE.to_string();
        }
    }
    error
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str(&format!("code: {}\n", error.code));
    out.push_str(&format!("message: {}\n", error.message));
    out.push_str(&format!("kind: {}\n", error.kind));

    if !error.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &error.metadata {
            out.push_str(&format!("  {key}: {value}\n"));
        }
    }
    out
}
