//! # index-config-domain
//!
//! Typed model of a vector database class ("collection") definition:
//!
//! - **Primitives** - `ClassName`, `PropertyName`
//! - **Vector index** - `HnswConfig`, `FlatConfig`, `DynamicConfig`, quantizers
//! - **Inverted index** - BM25, stopwords, metadata indexing flags
//! - **Class** - `ClassDefinition`, `NamedVector`, `ClassSnapshot`, `Schema`
//! - **Validation** - invariants checked before a definition is sent
//! - **Matching** - subset comparison of a request against the returned class
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use index_config_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod class;
pub mod inverted_index;
pub mod matching;
pub mod primitives;
pub mod property;
pub mod validation;
pub mod vector_index;

pub use class::{ClassDefinition, ClassDefinitionBuilder, ClassSnapshot, NamedVector, Schema};
pub use inverted_index::{Bm25Config, InvertedIndexConfig, StopwordPreset, StopwordsConfig};
pub use matching::{MismatchKind, NUMBER_TOLERANCE, SchemaMismatch, match_class, match_payload};
pub use primitives::{ClassName, PrimitiveError, PropertyName};
pub use property::{DataType, ModuleConfig, Property, Tokenization};
pub use validation::DefinitionError;
pub use vector_index::{
    BqConfig, Distance, DynamicConfig, FlatConfig, HnswConfig, PqConfig, PqEncoder,
    PqEncoderDistribution, PqEncoderType, SqConfig, VectorIndexConfig, VectorIndexType,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
