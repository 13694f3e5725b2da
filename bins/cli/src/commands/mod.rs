//! Command handlers and the wiring they share.

pub mod class;
pub mod config;
pub mod scenarios;
pub mod schema;

pub use class::{run_class_create, run_class_delete, run_class_show, run_class_verify};
pub use config::run_config_show;
pub use scenarios::{ScenarioRunArgs, run_scenarios_list, run_scenarios_run};
pub use schema::run_schema_show;

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, format_error_output};
use index_config_adapters::{
    InMemorySchema, JsonLogger, StderrLogSink, WeaviateRestConfig, WeaviateRestSchema,
};
use index_config_app::SchemaDeps;
use index_config_config::ClientConfig;
use index_config_domain::{ClassDefinition, ClassName};
use index_config_ports::{LogFields, LogLevel, schema_codes};
use index_config_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Where schema calls go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The configured service over REST.
    Rest,
    /// A throwaway in-process store with server-like defaults.
    InMemory,
}

/// Build use-case dependencies for one command run.
///
/// Verbose runs also log use-case events as JSON lines on stderr.
pub fn build_deps(
    config: &ClientConfig,
    backend: Backend,
    mode: OutputMode,
    ctx: &RequestContext,
) -> Result<SchemaDeps, ErrorEnvelope> {
    let deps = match backend {
        Backend::Rest => SchemaDeps::new(Arc::new(WeaviateRestSchema::new(
            WeaviateRestConfig::from(config),
        )?)),
        Backend::InMemory => SchemaDeps::new(Arc::new(InMemorySchema::new())),
    };
    if !mode.verbose {
        return Ok(deps);
    }

    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".into(),
        Value::String(ctx.correlation_id().as_str().to_owned()),
    );
    let logger = JsonLogger::new(Arc::new(StderrLogSink))
        .with_base_fields(fields)
        .with_min_level(LogLevel::Debug);
    Ok(deps.with_logger(Arc::new(logger)))
}

/// Drive `op` to completion on a current-thread runtime.
///
/// Ctrl-C cancels `ctx`; use cases observe it at their next checkpoint.
pub fn run_async<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> Result<T, CliError>
where
    F: Future<Output = T>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(async {
        let watcher = spawn_interrupt_watcher(&ctx);
        let output = op(ctx).await;
        watcher.abort();
        output
    }))
}

fn spawn_interrupt_watcher(ctx: &RequestContext) -> tokio::task::JoinHandle<()> {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(correlation_id = ctx.correlation_id().as_str(), "interrupted");
            ctx.cancel();
        }
    })
}

/// Render `result` with `render`, or as an error output.
pub fn render_result<T>(
    mode: OutputMode,
    result: Result<T, ErrorEnvelope>,
    render: impl FnOnce(T) -> Result<CliOutput, CliError>,
) -> Result<CliOutput, CliError> {
    match result {
        Ok(value) => render(value),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Read a class definition from a JSON or TOML file (by extension) and validate it.
pub fn read_definition(path: &Path) -> Result<ClassDefinition, ErrorEnvelope> {
    let path_meta = path.display().to_string();
    let text = std::fs::read_to_string(path)
        .map_err(|error| ErrorEnvelope::from(error).with_metadata("path", path_meta.as_str()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed: Result<ClassDefinition, String> = if is_toml {
        toml::from_str(&text).map_err(|error| error.to_string())
    } else {
        serde_json::from_str(&text).map_err(|error| error.to_string())
    };
    let definition = parsed.map_err(|message| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("invalid class definition: {}", message.trim()),
        )
        .with_metadata("path", path_meta.as_str())
    })?;

    definition.validate()?;
    Ok(definition)
}

/// Error returned when a class the user named is absent.
pub fn class_missing(class: &ClassName) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        schema_codes::class_missing(),
        format!("Class missing: {}", class.as_str()),
    )
    .with_metadata("class", class.as_str())
}
