//! # index-config-ports
//!
//! Port traits for the index-config hexagonal architecture.
//!
//! This crate defines the interfaces between the domain and infrastructure
//! layers. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod schema;

pub use logger::*;
pub use schema::{SchemaPort, SchemaProviderInfo, codes as schema_codes};

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without naming `index-config-domain` for these.
pub use index_config_domain::{ClassDefinition, ClassName, ClassSnapshot, Schema};
