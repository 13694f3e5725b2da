//! Scenario catalog commands.

use super::{Backend, build_deps, render_result, run_async};
use crate::CliOutput;
use crate::error::{CliError, ExitCode, exit_code_for};
use crate::format::{OutputMode, format_error_output, ok_output, to_json_line};
use index_config_app::{
    Scenario, ScenarioReport, ScenarioSummary, run_scenarios, scenario_catalog, select_scenarios,
};
use index_config_config::ValidatedClientConfig;
use index_config_shared::{ErrorEnvelope, RequestContext};
use std::fmt::Write as _;

/// Flags of `scenarios run`.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioRunArgs<'a> {
    pub only: &'a [String],
    pub keep_going: bool,
    pub backend: Backend,
}

/// List the catalog.
pub fn run_scenarios_list(
    mode: OutputMode,
    config: &ValidatedClientConfig,
) -> Result<CliOutput, CliError> {
    render_result(mode, scenario_catalog(config.class_name()), |catalog| {
        let stdout = if mode.is_json() {
            format_list_json(&catalog)?
        } else {
            format_list_text(&catalog)
        };
        Ok(ok_output(stdout))
    })
}

fn format_list_text(catalog: &[Scenario]) -> String {
    let mut out = String::new();
    for scenario in catalog {
        let _ = writeln!(
            out,
            "{:<16} {:<8} {}",
            scenario.name,
            scenario.definition.effective_index_type().as_str(),
            scenario.description
        );
    }
    out
}

fn format_list_json(catalog: &[Scenario]) -> Result<String, CliError> {
    let scenarios = catalog
        .iter()
        .map(|scenario| -> Result<serde_json::Value, CliError> {
            Ok(serde_json::json!({
                "name": scenario.name,
                "description": scenario.description,
                "indexType": scenario.definition.effective_index_type().as_str(),
                "strict": scenario.strict,
                "definition": serde_json::to_value(&scenario.definition)?,
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    to_json_line(&serde_json::json!({ "status": "ok", "scenarios": scenarios }))
}

/// Run the selected scenarios against the configured service or an in-memory store.
pub fn run_scenarios_run(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    args: ScenarioRunArgs<'_>,
) -> Result<CliOutput, CliError> {
    let selected = scenario_catalog(config.class_name())
        .and_then(|catalog| select_scenarios(catalog, args.only));
    let scenarios = match selected {
        Ok(scenarios) => scenarios,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let ctx = RequestContext::new_request();
    let deps = match build_deps(config, args.backend, mode, &ctx) {
        Ok(deps) => deps,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let keep_going = args.keep_going || config.scenarios.keep_going;
    tracing::debug!(count = scenarios.len(), keep_going, "running scenarios");

    let summary = run_async(ctx, |ctx| async move {
        run_scenarios(&ctx, &deps, &scenarios, keep_going).await
    })?;

    let stdout = if mode.is_json() {
        let status = if summary.succeeded() { "ok" } else { "error" };
        to_json_line(&serde_json::json!({
            "status": status,
            "summary": serde_json::to_value(&summary)?,
        }))?
    } else {
        format_summary_text(&summary)
    };
    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: summary_exit_code(&summary),
    })
}

/// Exit code of a batch: the first failure decides.
pub fn summary_exit_code(summary: &ScenarioSummary) -> ExitCode {
    if summary.succeeded() {
        return ExitCode::Ok;
    }
    summary
        .reports
        .iter()
        .find_map(|report| report.error.as_ref())
        .map_or(ExitCode::Internal, exit_code_for)
}

fn format_summary_text(summary: &ScenarioSummary) -> String {
    let mut out = String::new();
    for report in &summary.reports {
        write_report(&mut out, report);
    }
    let _ = writeln!(
        out,
        "summary: passed {}, failed {}, skipped {}{}",
        summary.passed,
        summary.failed,
        summary.skipped,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    out
}

fn write_report(out: &mut String, report: &ScenarioReport) {
    let _ = writeln!(
        out,
        "{} {:<16} {:<8} {}ms",
        if report.passed() { "PASS" } else { "FAIL" },
        report.name,
        report.index_type.as_str(),
        report.duration_ms
    );
    if let Some(error) = report.error.as_ref() {
        write_error_line(out, error);
    }
    for mismatch in &report.mismatches {
        let _ = writeln!(out, "     ~ {mismatch}");
    }
}

fn write_error_line(out: &mut String, error: &ErrorEnvelope) {
    let _ = writeln!(out, "     {}: {}", error.code, error.message);
}
