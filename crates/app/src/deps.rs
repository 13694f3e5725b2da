//! Dependencies shared by the schema use cases.

use index_config_ports::{LogFields, LoggerPort, SchemaPort};
use index_config_shared::ErrorEnvelope;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Dependencies required by the schema use cases.
#[derive(Clone)]
pub struct SchemaDeps {
    /// Schema adapter.
    pub schema: Arc<dyn SchemaPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

impl SchemaDeps {
    /// Deps without a logger.
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaPort>) -> Self {
        Self {
            schema,
            logger: None,
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn log_info(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.info(event, message, Some(fields));
        }
    }

    /// Log a failure, or an abort when the error is a cancellation.
    pub(crate) fn log_failure(&self, prefix: &str, fields: LogFields, error: &ErrorEnvelope) {
        let Some(logger) = self.logger.as_ref() else {
            return;
        };
        if error.is_cancelled() {
            logger.info(&format!("{prefix}.aborted"), "Aborted", Some(fields));
        } else {
            logger.failure(&format!("{prefix}.failed"), Some(fields), error);
        }
    }
}

pub(crate) fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn fields_class(class: &str) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("className".into(), Value::String(class.to_owned()));
    fields
}

pub(crate) fn with_duration(mut fields: LogFields, started_at: Instant) -> LogFields {
    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
    fields
}
