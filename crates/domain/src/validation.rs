//! Class definition invariants checked before anything reaches the service.

use crate::class::ClassDefinition;
use crate::inverted_index::InvertedIndexConfig;
use crate::property::Property;
use crate::vector_index::{DynamicConfig, HnswConfig, VectorIndexConfig, VectorIndexType};
use index_config_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeSet;
use std::fmt;

/// Validation failures for class definitions.
///
/// `target` names the vector being checked: `class` for the class-level
/// vector, or `vectorConfig.<name>` for a named vector.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// Settings family differs from the declared index type.
    IndexTypeMismatch {
        /// Vector being checked.
        target: String,
        /// Declared `vectorIndexType`.
        declared: VectorIndexType,
        /// Family of the supplied settings.
        configured: VectorIndexType,
    },
    /// `dynamicEfMin` is greater than `dynamicEfMax`.
    DynamicEfRange {
        /// Vector being checked.
        target: String,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
    /// `ef` is below `-1`.
    InvalidEf {
        /// Vector being checked.
        target: String,
        /// Supplied value.
        ef: i64,
    },
    /// `maxConnections` is zero.
    ZeroMaxConnections {
        /// Vector being checked.
        target: String,
    },
    /// `efConstruction` is zero.
    ZeroEfConstruction {
        /// Vector being checked.
        target: String,
    },
    /// More than one quantizer is enabled.
    MultipleQuantizers {
        /// Vector being checked.
        target: String,
        /// Names of the enabled quantizers.
        enabled: Vec<&'static str>,
    },
    /// Dynamic index threshold is zero.
    ZeroDynamicThreshold {
        /// Vector being checked.
        target: String,
    },
    /// BM25 `b` outside `0.0..=1.0`.
    Bm25B {
        /// Supplied value.
        b: f64,
    },
    /// BM25 `k1` negative.
    Bm25K1 {
        /// Supplied value.
        k1: f64,
    },
    /// Property has no data type.
    EmptyDataType {
        /// Property name.
        property: String,
    },
    /// Property name appears twice.
    DuplicateProperty {
        /// Property name.
        property: String,
    },
    /// Range filter index requested on a non-numeric/date type.
    RangeFiltersUnsupported {
        /// Property name.
        property: String,
        /// Data type of the property.
        data_type: String,
    },
    /// Searchable index requested on a non-text type.
    SearchableUnsupported {
        /// Property name.
        property: String,
        /// Data type of the property.
        data_type: String,
    },
    /// Named vectors combined with a class-level index type or settings.
    NamedVectorsWithClassIndex,
}

impl DefinitionError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::IndexTypeMismatch { .. } => "index_type_mismatch",
            Self::DynamicEfRange { .. }
            | Self::InvalidEf { .. }
            | Self::ZeroMaxConnections { .. }
            | Self::ZeroEfConstruction { .. }
            | Self::MultipleQuantizers { .. } => "invalid_hnsw",
            Self::ZeroDynamicThreshold { .. } => "invalid_dynamic",
            Self::Bm25B { .. } | Self::Bm25K1 { .. } => "invalid_bm25",
            Self::EmptyDataType { .. }
            | Self::DuplicateProperty { .. }
            | Self::RangeFiltersUnsupported { .. }
            | Self::SearchableUnsupported { .. } => "invalid_property",
            Self::NamedVectorsWithClassIndex => "conflicting_vectors",
        };
        ErrorCode::new("domain", code)
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexTypeMismatch {
                target,
                declared,
                configured,
            } => write!(
                formatter,
                "{target}: vectorIndexType `{declared}` does not match `{configured}` settings"
            ),
            Self::DynamicEfRange { target, min, max } => write!(
                formatter,
                "{target}: dynamicEfMin ({min}) must not exceed dynamicEfMax ({max})"
            ),
            Self::InvalidEf { target, ef } => {
                write!(formatter, "{target}: ef must be -1 or non-negative, got {ef}")
            },
            Self::ZeroMaxConnections { target } => {
                write!(formatter, "{target}: maxConnections must be greater than zero")
            },
            Self::ZeroEfConstruction { target } => {
                write!(formatter, "{target}: efConstruction must be greater than zero")
            },
            Self::MultipleQuantizers { target, enabled } => write!(
                formatter,
                "{target}: at most one quantizer may be enabled, found {}",
                enabled.join(", ")
            ),
            Self::ZeroDynamicThreshold { target } => {
                write!(formatter, "{target}: dynamic threshold must be greater than zero")
            },
            Self::Bm25B { b } => write!(formatter, "bm25.b must be within 0..=1, got {b}"),
            Self::Bm25K1 { k1 } => write!(formatter, "bm25.k1 must be non-negative, got {k1}"),
            Self::EmptyDataType { property } => {
                write!(formatter, "property `{property}` must declare a data type")
            },
            Self::DuplicateProperty { property } => {
                write!(formatter, "property `{property}` is declared more than once")
            },
            Self::RangeFiltersUnsupported {
                property,
                data_type,
            } => write!(
                formatter,
                "property `{property}`: indexRangeFilters is not supported for `{data_type}`"
            ),
            Self::SearchableUnsupported {
                property,
                data_type,
            } => write!(
                formatter,
                "property `{property}`: indexSearchable is not supported for `{data_type}`"
            ),
            Self::NamedVectorsWithClassIndex => formatter.write_str(
                "named vectors cannot be combined with a class-level vector index",
            ),
        }
    }
}

impl std::error::Error for DefinitionError {}

impl From<DefinitionError> for ErrorEnvelope {
    fn from(error: DefinitionError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            DefinitionError::IndexTypeMismatch {
                target,
                declared,
                configured,
            } => envelope
                .with_metadata("target", target)
                .with_metadata("declared", declared.as_str())
                .with_metadata("configured", configured.as_str()),
            DefinitionError::DynamicEfRange { target, .. }
            | DefinitionError::InvalidEf { target, .. }
            | DefinitionError::ZeroMaxConnections { target }
            | DefinitionError::ZeroEfConstruction { target }
            | DefinitionError::MultipleQuantizers { target, .. }
            | DefinitionError::ZeroDynamicThreshold { target } => {
                envelope.with_metadata("target", target)
            },
            DefinitionError::EmptyDataType { property }
            | DefinitionError::DuplicateProperty { property } => {
                envelope.with_metadata("property", property)
            },
            DefinitionError::RangeFiltersUnsupported {
                property,
                data_type,
            }
            | DefinitionError::SearchableUnsupported {
                property,
                data_type,
            } => envelope
                .with_metadata("property", property)
                .with_metadata("data_type", data_type),
            DefinitionError::Bm25B { .. }
            | DefinitionError::Bm25K1 { .. }
            | DefinitionError::NamedVectorsWithClassIndex => envelope,
        }
    }
}

pub(crate) fn validate_definition(definition: &ClassDefinition) -> Result<(), DefinitionError> {
    if definition.has_named_vectors()
        && (definition.vector_index_type.is_some() || definition.vector_index_config.is_some())
    {
        return Err(DefinitionError::NamedVectorsWithClassIndex);
    }

    if let Some(config) = &definition.vector_index_config {
        if let Some(declared) = definition.vector_index_type {
            ensure_family("class", declared, config)?;
        }
        validate_index_config("class", config)?;
    }

    for (name, vector) in &definition.vector_config {
        let target = format!("vectorConfig.{name}");
        if let Some(config) = &vector.vector_index_config {
            ensure_family(&target, vector.vector_index_type, config)?;
            validate_index_config(&target, config)?;
        }
    }

    if let Some(inverted) = &definition.inverted_index_config {
        validate_inverted_index(inverted)?;
    }

    validate_properties(&definition.properties)
}

fn ensure_family(
    target: &str,
    declared: VectorIndexType,
    config: &VectorIndexConfig,
) -> Result<(), DefinitionError> {
    let configured = config.index_type();
    if declared == configured {
        Ok(())
    } else {
        Err(DefinitionError::IndexTypeMismatch {
            target: target.to_owned(),
            declared,
            configured,
        })
    }
}

fn validate_index_config(target: &str, config: &VectorIndexConfig) -> Result<(), DefinitionError> {
    match config {
        VectorIndexConfig::Hnsw(hnsw) => validate_hnsw(target, hnsw),
        // Flat settings only carry BQ, so there is nothing to cross-check.
        VectorIndexConfig::Flat(_) => Ok(()),
        VectorIndexConfig::Dynamic(dynamic) => validate_dynamic(target, dynamic),
    }
}

fn validate_hnsw(target: &str, config: &HnswConfig) -> Result<(), DefinitionError> {
    if let (Some(min), Some(max)) = (config.dynamic_ef_min, config.dynamic_ef_max)
        && min > max
    {
        return Err(DefinitionError::DynamicEfRange {
            target: target.to_owned(),
            min,
            max,
        });
    }
    if let Some(ef) = config.ef
        && ef < -1
    {
        return Err(DefinitionError::InvalidEf {
            target: target.to_owned(),
            ef,
        });
    }
    if config.max_connections == Some(0) {
        return Err(DefinitionError::ZeroMaxConnections {
            target: target.to_owned(),
        });
    }
    if config.ef_construction == Some(0) {
        return Err(DefinitionError::ZeroEfConstruction {
            target: target.to_owned(),
        });
    }
    let enabled = config.enabled_quantizers();
    if enabled.len() > 1 {
        return Err(DefinitionError::MultipleQuantizers {
            target: target.to_owned(),
            enabled,
        });
    }
    Ok(())
}

fn validate_dynamic(target: &str, config: &DynamicConfig) -> Result<(), DefinitionError> {
    if config.threshold == Some(0) {
        return Err(DefinitionError::ZeroDynamicThreshold {
            target: target.to_owned(),
        });
    }
    if let Some(hnsw) = &config.hnsw {
        validate_hnsw(&format!("{target}.hnsw"), hnsw)?;
    }
    Ok(())
}

fn validate_inverted_index(config: &InvertedIndexConfig) -> Result<(), DefinitionError> {
    if let Some(bm25) = config.bm25 {
        if !(0.0..=1.0).contains(&bm25.b) {
            return Err(DefinitionError::Bm25B { b: bm25.b });
        }
        if bm25.k1.is_nan() || bm25.k1 < 0.0 {
            return Err(DefinitionError::Bm25K1 { k1: bm25.k1 });
        }
    }
    Ok(())
}

fn validate_properties(properties: &[Property]) -> Result<(), DefinitionError> {
    let mut seen = BTreeSet::new();
    for property in properties {
        let name = property.name.as_str();
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(DefinitionError::DuplicateProperty {
                property: name.to_owned(),
            });
        }
        let Some(data_type) = property.data_type.first() else {
            return Err(DefinitionError::EmptyDataType {
                property: name.to_owned(),
            });
        };
        if property.index_range_filters == Some(true) && !data_type.supports_range_filters() {
            return Err(DefinitionError::RangeFiltersUnsupported {
                property: name.to_owned(),
                data_type: data_type.to_string(),
            });
        }
        if property.index_searchable == Some(true) && !data_type.supports_searchable() {
            return Err(DefinitionError::SearchableUnsupported {
                property: name.to_owned(),
                data_type: data_type.to_string(),
            });
        }
    }
    Ok(())
}
