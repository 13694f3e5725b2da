//! # index-config-shared
//!
//! Shared foundations for the index-config workspace:
//!
//! - Result alias and the structured [`ErrorEnvelope`]
//! - Request context with correlation ids and cooperative cancellation
//! - Retry with exponential backoff
//! - Secret redaction helpers
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod errors;
pub mod redaction;
pub mod retry;

pub use context::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, REDACTED_VALUE};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use retry::{RetryPolicy, retry_async, retry_async_with_observer};

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
