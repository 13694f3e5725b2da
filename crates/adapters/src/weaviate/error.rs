//! REST error mapping helpers.

use index_config_ports::schema_codes;
use index_config_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;

/// Provider id attached to error metadata.
pub const PROVIDER_ID: &str = "weaviate_rest";

/// Context payload attached to REST error envelopes.
#[derive(Debug, Clone)]
pub struct SchemaErrorContext {
    /// Operation label for tracing failures.
    pub operation: &'static str,
    /// Class name, when the request is class-scoped.
    pub class_name: Option<String>,
    /// Endpoint path.
    pub endpoint: String,
}

impl SchemaErrorContext {
    fn decorate(&self, envelope: ErrorEnvelope) -> ErrorEnvelope {
        let envelope = envelope
            .with_metadata("provider", PROVIDER_ID)
            .with_metadata("operation", self.operation)
            .with_metadata("endpoint", self.endpoint.clone());
        match self.class_name.as_ref() {
            Some(class) => envelope.with_metadata("class", class.clone()),
            None => envelope,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error: Vec<ServiceErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorItem {
    message: String,
}

/// Extract the message from a service error body.
///
/// The service answers `{"error":[{"message":"..."}]}`; anything else is
/// used verbatim.
pub fn error_message_from_body(http_status: u16, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ServiceErrorBody>(body) {
        let messages: Vec<&str> = parsed
            .error
            .iter()
            .map(|item| item.message.trim())
            .filter(|message| !message.is_empty())
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP {http_status}")
    } else {
        text.to_owned()
    }
}

/// Map a non-success HTTP status and body into a shared envelope.
pub fn map_rest_error(http_status: u16, body: &[u8], ctx: &SchemaErrorContext) -> ErrorEnvelope {
    let message = error_message_from_body(http_status, body);
    let code = choose_code(http_status, &message);
    let class = if is_retriable_code(&code) {
        ErrorClass::Retriable
    } else {
        ErrorClass::NonRetriable
    };

    let envelope = ErrorEnvelope::unexpected(code, message, class)
        .with_metadata("http_status", http_status.to_string());
    ctx.decorate(envelope)
}

/// Map reqwest transport errors into shared envelopes.
pub fn map_rest_transport_error(error: &reqwest::Error, ctx: &SchemaErrorContext) -> ErrorEnvelope {
    let envelope = if error.is_timeout() {
        ErrorEnvelope::unexpected(
            schema_codes::timeout(),
            format!("schema request timed out: {error}"),
            ErrorClass::Retriable,
        )
    } else if error.is_connect() {
        ErrorEnvelope::unexpected(
            schema_codes::connection(),
            format!("could not connect to the vector database: {error}"),
            ErrorClass::Retriable,
        )
    } else {
        ErrorEnvelope::unexpected(
            schema_codes::unknown(),
            format!("schema request failed: {error}"),
            ErrorClass::NonRetriable,
        )
    };
    ctx.decorate(envelope)
}

/// Error for a body that could not be decoded.
pub fn invalid_response_error(error: &serde_json::Error, ctx: &SchemaErrorContext) -> ErrorEnvelope {
    ctx.decorate(ErrorEnvelope::unexpected(
        schema_codes::invalid_response(),
        format!("invalid schema response: {error}"),
        ErrorClass::NonRetriable,
    ))
}

/// Error for a request that exceeded the per-request timeout.
pub fn timeout_error(ctx: &SchemaErrorContext) -> ErrorEnvelope {
    ctx.decorate(ErrorEnvelope::unexpected(
        schema_codes::timeout(),
        "schema request timed out",
        ErrorClass::Retriable,
    ))
}

/// Error for a request abandoned because the context was cancelled.
pub fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

fn choose_code(http_status: u16, message: &str) -> ErrorCode {
    match http_status {
        401 | 403 => schema_codes::auth(),
        404 => schema_codes::not_found(),
        408 | 504 => schema_codes::timeout(),
        422 if message.to_ascii_lowercase().contains("already exists") => {
            schema_codes::class_exists()
        },
        422 => schema_codes::invalid_class(),
        500..=599 => schema_codes::server(),
        _ => schema_codes::unknown(),
    }
}

fn is_retriable_code(code: &ErrorCode) -> bool {
    *code == schema_codes::timeout()
        || *code == schema_codes::connection()
        || *code == schema_codes::server()
}
