//! Schema listing command.

use super::{Backend, build_deps, render_result, run_async};
use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, ok_output, to_json_line};
use index_config_config::ValidatedClientConfig;
use index_config_domain::Schema;
use index_config_shared::RequestContext;
use std::fmt::Write as _;

/// List the classes the service holds.
pub fn run_schema_show(
    mode: OutputMode,
    config: &ValidatedClientConfig,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    let deps = build_deps(config, Backend::Rest, mode, &ctx);

    let result = run_async(ctx, |ctx| async move {
        let deps = deps?;
        deps.schema.get_schema(&ctx).await
    })?;

    render_result(mode, result, |schema| {
        let stdout = if mode.is_json() {
            to_json_line(&serde_json::json!({
                "status": "ok",
                "classes": serde_json::to_value(&schema.classes)?,
            }))?
        } else {
            format_schema_text(&schema)
        };
        Ok(ok_output(stdout))
    })
}

fn format_schema_text(schema: &Schema) -> String {
    if schema.classes.is_empty() {
        return "classes: none\n".to_string();
    }
    let mut out = String::from("classes:\n");
    for class in &schema.classes {
        let index_type = class
            .vector_index_type()
            .map_or("named", |index_type| index_type.as_str());
        let _ = writeln!(
            out,
            "  {:<32} {index_type}",
            class.class_name().unwrap_or("<unnamed>")
        );
    }
    out
}
