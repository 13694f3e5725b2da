//! Drop a class if present, then create it from a definition.

use crate::deps::{SchemaDeps, fields_class, with_duration};
use index_config_domain::ClassDefinition;
use index_config_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::time::Instant;

/// Result of a recreate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecreateOutcome {
    /// True when an existing class was deleted first.
    pub replaced: bool,
}

/// Validate `definition`, delete any class with the same name, then create it.
#[tracing::instrument(name = "app.recreate_class", skip_all, fields(class = %definition.class.as_str()))]
pub async fn recreate_class(
    ctx: &RequestContext,
    deps: &SchemaDeps,
    definition: ClassDefinition,
) -> Result<RecreateOutcome> {
    let started_at = Instant::now();
    let class_name = definition.class.as_str().to_owned();
    let mut start_fields = fields_class(&class_name);
    start_fields.insert(
        "indexType".into(),
        Value::from(definition.effective_index_type().as_str()),
    );
    deps.log_info("app.recreateClass.start", "Recreate class started", start_fields);

    let result: Result<RecreateOutcome> = (async {
        ctx.ensure_not_cancelled("recreate_class.start")?;
        definition.validate().map_err(ErrorEnvelope::from)?;

        let exists = deps
            .schema
            .class_exists(ctx, definition.class.clone())
            .await?;
        if exists {
            ctx.ensure_not_cancelled("recreate_class.delete_class")?;
            deps.schema.delete_class(ctx, definition.class.clone()).await?;
        }

        ctx.ensure_not_cancelled("recreate_class.create_class")?;
        deps.schema.create_class(ctx, definition).await?;
        Ok(RecreateOutcome { replaced: exists })
    })
    .await;

    match result {
        Ok(outcome) => {
            let mut fields = with_duration(fields_class(&class_name), started_at);
            fields.insert("replaced".into(), Value::Bool(outcome.replaced));
            deps.log_info(
                "app.recreateClass.completed",
                "Recreate class completed",
                fields,
            );
            Ok(outcome)
        },
        Err(error) => {
            deps.log_failure(
                "app.recreateClass",
                with_duration(fields_class(&class_name), started_at),
                &error,
            );
            Err(error)
        },
    }
}
