//! Effective configuration command.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, format_error_output, ok_output, to_json_line};
use index_config_config::{ValidatedClientConfig, to_pretty_json, to_pretty_toml};
use std::path::Path;

/// Print the merged config (defaults, file, env) with secrets redacted.
pub fn run_config_show(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let rendered = if mode.is_json() {
        to_pretty_json(config)
    } else {
        to_pretty_toml(config)
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_json() {
        let effective: serde_json::Value = serde_json::from_str(rendered.trim())?;
        to_json_line(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": effective,
        }))?
    } else {
        let mut out = String::from("status: ok\n");
        if let Some(path) = path {
            out.push_str(&format!("path: {}\n", path.to_string_lossy()));
        }
        out.push_str("config:\n");
        out.push_str(&rendered);
        out
    };
    Ok(ok_output(stdout))
}
