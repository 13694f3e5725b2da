//! # index-config-adapters
//!
//! Adapter implementations for ports (REST schema client, in-memory schema,
//! structured logger). This crate depends on `ports`, `config`, `domain`, and
//! `shared`.

pub mod in_memory;
pub mod log_sink;
pub mod logger;
/// REST schema adapter.
pub mod weaviate;

pub use in_memory::{InMemorySchema, with_server_defaults};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use weaviate::{WeaviateRestConfig, WeaviateRestSchema};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
