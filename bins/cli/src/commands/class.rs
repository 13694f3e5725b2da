//! Single-class commands: create, show, delete, verify.

use super::{Backend, build_deps, class_missing, read_definition, render_result, run_async};
use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, ok_output, to_json_line};
use index_config_app::{ClassExpectation, VerifyOutcome, recreate_class, verify_class};
use index_config_config::ValidatedClientConfig;
use index_config_domain::{ClassName, ClassSnapshot};
use index_config_shared::{ErrorEnvelope, RequestContext};
use std::fmt::Write as _;
use std::path::Path;

/// Create a class from a definition file, optionally replacing an existing one.
pub fn run_class_create(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    file: &Path,
    recreate: bool,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    let deps = build_deps(config, Backend::Rest, mode, &ctx);
    let definition = read_definition(file);

    let result = run_async(ctx, |ctx| async move {
        let deps = deps?;
        let definition = definition?;
        let class = definition.class.as_str().to_owned();
        let index_type = definition.effective_index_type();
        let replaced = if recreate {
            recreate_class(&ctx, &deps, definition).await?.replaced
        } else {
            deps.schema.create_class(&ctx, definition).await?;
            false
        };
        Ok::<_, ErrorEnvelope>((class, index_type, replaced))
    })?;

    render_result(mode, result, |(class, index_type, replaced)| {
        let stdout = if mode.is_json() {
            to_json_line(&serde_json::json!({
                "status": "ok",
                "class": class,
                "indexType": index_type.as_str(),
                "replaced": replaced,
            }))?
        } else {
            format!(
                "status: ok\nclass: {class}\nindexType: {}\nreplaced: {replaced}\n",
                index_type.as_str()
            )
        };
        Ok(ok_output(stdout))
    })
}

/// Print a class as the service stores it.
pub fn run_class_show(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    name: &str,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    let deps = build_deps(config, Backend::Rest, mode, &ctx);
    let class = ClassName::parse(name).map_err(ErrorEnvelope::from);

    let result = run_async(ctx, |ctx| async move {
        let deps = deps?;
        let class = class?;
        let snapshot = deps.schema.get_class(&ctx, class.clone()).await?;
        snapshot.ok_or_else(|| class_missing(&class))
    })?;

    render_result(mode, result, |snapshot: ClassSnapshot| {
        let stdout = if mode.is_json() {
            to_json_line(&serde_json::json!({
                "status": "ok",
                "class": snapshot.as_value(),
            }))?
        } else {
            to_json_line(snapshot.as_value())?
        };
        Ok(ok_output(stdout))
    })
}

/// Delete a class. Deleting an absent class succeeds.
pub fn run_class_delete(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    name: &str,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    let deps = build_deps(config, Backend::Rest, mode, &ctx);
    let class = ClassName::parse(name).map_err(ErrorEnvelope::from);

    let result = run_async(ctx, |ctx| async move {
        let deps = deps?;
        let class = class?;
        deps.schema.delete_class(&ctx, class.clone()).await?;
        Ok::<_, ErrorEnvelope>(class)
    })?;

    render_result(mode, result, |class| {
        let stdout = if mode.is_json() {
            to_json_line(&serde_json::json!({ "status": "ok", "deleted": class.as_str() }))?
        } else {
            format!("status: ok\ndeleted: {}\n", class.as_str())
        };
        Ok(ok_output(stdout))
    })
}

/// Check a stored class against a definition file.
pub fn run_class_verify(
    mode: OutputMode,
    config: &ValidatedClientConfig,
    file: &Path,
    strict: bool,
) -> Result<CliOutput, CliError> {
    let ctx = RequestContext::new_request();
    let deps = build_deps(config, Backend::Rest, mode, &ctx);
    let definition = read_definition(file);

    let result = run_async(ctx, |ctx| async move {
        let deps = deps?;
        let expectation = ClassExpectation {
            definition: definition?,
            strict,
        };
        verify_class(&ctx, &deps, expectation).await
    })?;

    render_result(mode, result, |outcome| {
        let stdout = if mode.is_json() {
            to_json_line(&serde_json::json!({
                "status": "ok",
                "class": outcome.snapshot.class_name(),
                "mismatches": outcome.mismatches,
            }))?
        } else {
            format_verify_text(&outcome)
        };
        Ok(ok_output(stdout))
    })
}

fn format_verify_text(outcome: &VerifyOutcome) -> String {
    let mut out = String::from("status: ok\n");
    let _ = writeln!(out, "class: {}", outcome.snapshot.class_name().unwrap_or("<none>"));
    if outcome.mismatches.is_empty() {
        out.push_str("mismatches: none\n");
        return out;
    }
    out.push_str("mismatches:\n");
    for mismatch in &outcome.mismatches {
        let _ = writeln!(out, "  {mismatch}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_config_domain::{MismatchKind, SchemaMismatch};
    use serde_json::json;

    #[test]
    fn verify_text_lists_mismatches() {
        let outcome = VerifyOutcome {
            snapshot: ClassSnapshot::new(json!({ "class": "ConfigCollection" })),
            mismatches: vec![SchemaMismatch {
                path: "vectorIndexConfig.efConstruction".to_owned(),
                kind: MismatchKind::Different {
                    expected: json!(256),
                    actual: json!(128),
                },
            }],
        };
        assert_eq!(
            format_verify_text(&outcome),
            "status: ok\nclass: ConfigCollection\nmismatches:\n  \
             vectorIndexConfig.efConstruction: expected 256, got 128\n"
        );
    }

    #[test]
    fn verify_text_without_mismatches() {
        let outcome = VerifyOutcome {
            snapshot: ClassSnapshot::new(json!({ "class": "Docs" })),
            mismatches: Vec::new(),
        };
        assert_eq!(
            format_verify_text(&outcome),
            "status: ok\nclass: Docs\nmismatches: none\n"
        );
    }
}
