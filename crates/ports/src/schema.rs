//! Schema boundary contract for the remote vector database.

use crate::BoxFuture;
use index_config_domain::{ClassDefinition, ClassName, ClassSnapshot, Schema};
use index_config_shared::{RequestContext, Result};

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProviderInfo {
    /// Stable provider identifier, e.g. `weaviate-rest`.
    pub id: Box<str>,
    /// Human-readable provider name.
    pub name: Box<str>,
}

/// Boundary contract for reading and changing class definitions.
///
/// Futures borrow only `self`; implementations clone what they need from the
/// request context.
pub trait SchemaPort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &SchemaProviderInfo;

    /// Return true when the class exists.
    fn class_exists(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<bool>>;

    /// Fetch the full schema listing.
    fn get_schema(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Schema>>;

    /// Fetch one class as the service stores it, or `None` when absent.
    fn get_class(
        &self,
        ctx: &RequestContext,
        class: ClassName,
    ) -> BoxFuture<'_, Result<Option<ClassSnapshot>>>;

    /// Create a class. Fails with `schema:class_exists` when it already exists.
    fn create_class(
        &self,
        ctx: &RequestContext,
        definition: ClassDefinition,
    ) -> BoxFuture<'_, Result<()>>;

    /// Delete a class. Deleting an absent class succeeds.
    fn delete_class(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<()>>;
}

/// Stable `schema:*` error codes shared by adapters and use cases.
pub mod codes {
    use index_config_shared::ErrorCode;

    /// Namespace for schema errors.
    pub const NAMESPACE: &str = "schema";

    /// Credentials missing or rejected.
    #[must_use]
    pub fn auth() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "auth")
    }

    /// Resource not found.
    #[must_use]
    pub fn not_found() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "not_found")
    }

    /// Request timed out.
    #[must_use]
    pub fn timeout() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "timeout")
    }

    /// Service unreachable.
    #[must_use]
    pub fn connection() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "connection")
    }

    /// Class already exists.
    #[must_use]
    pub fn class_exists() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "class_exists")
    }

    /// Service rejected the class definition.
    #[must_use]
    pub fn invalid_class() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "invalid_class")
    }

    /// Server-side failure.
    #[must_use]
    pub fn server() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "server")
    }

    /// Unclassified failure.
    #[must_use]
    pub fn unknown() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "unknown")
    }

    /// Response body could not be decoded.
    #[must_use]
    pub fn invalid_response() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "invalid_response")
    }

    /// Class not listed after creation.
    #[must_use]
    pub fn class_missing() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "class_missing")
    }

    /// Returned index type differs from the request.
    #[must_use]
    pub fn wrong_index_type() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "wrong_index_type")
    }

    /// Returned class differs from the request.
    #[must_use]
    pub fn mismatch() -> ErrorCode {
        ErrorCode::new(NAMESPACE, "mismatch")
    }
}
