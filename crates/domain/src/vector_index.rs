//! Vector index configuration (HNSW, flat, dynamic) and quantizers.
//!
//! Field names serialize to the camelCase keys the service expects inside
//! `vectorIndexConfig`. Every knob is optional: unset fields are omitted from
//! the payload and the service applies its own defaults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vector index family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorIndexType {
    /// Hierarchical Navigable Small World graph.
    Hnsw,
    /// Brute-force flat index.
    Flat,
    /// Starts flat and upgrades to HNSW past a threshold.
    Dynamic,
}

impl VectorIndexType {
    /// Wire string used by the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hnsw => "hnsw",
            Self::Flat => "flat",
            Self::Dynamic => "dynamic",
        }
    }

    /// Parse the wire string (case-insensitive).
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hnsw" => Some(Self::Hnsw),
            "flat" => Some(Self::Flat),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

impl fmt::Display for VectorIndexType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    /// Cosine distance.
    #[serde(rename = "cosine")]
    Cosine,
    /// Negative dot product.
    #[serde(rename = "dot")]
    Dot,
    /// Squared euclidean distance.
    #[serde(rename = "l2-squared")]
    L2Squared,
    /// Hamming distance.
    #[serde(rename = "hamming")]
    Hamming,
    /// Manhattan distance.
    #[serde(rename = "manhattan")]
    Manhattan,
}

/// Product quantization encoder type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PqEncoderType {
    /// K-means encoder.
    Kmeans,
    /// Tile encoder.
    Tile,
}

/// Distribution assumed by the tile encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PqEncoderDistribution {
    /// Log-normal distribution.
    #[serde(rename = "log-normal")]
    LogNormal,
    /// Normal distribution.
    #[serde(rename = "normal")]
    Normal,
}

/// Product quantization encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PqEncoder {
    /// Encoder type.
    #[serde(rename = "type")]
    pub kind: PqEncoderType,
    /// Encoder distribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<PqEncoderDistribution>,
}

/// Product quantization (PQ) settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PqConfig {
    /// Whether PQ compression is enabled.
    pub enabled: bool,
    /// Number of segments per vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
    /// Number of centroids per segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroids: Option<u32>,
    /// Objects used to train the codebook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_limit: Option<u64>,
    /// Encoder settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<PqEncoder>,
}

impl PqConfig {
    /// Enabled PQ with service defaults.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            segments: None,
            centroids: None,
            training_limit: None,
            encoder: None,
        }
    }
}

/// Binary quantization (BQ) settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BqConfig {
    /// Whether BQ compression is enabled.
    pub enabled: bool,
    /// Cache compressed vectors in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    /// Candidates re-scored with full vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescore_limit: Option<i64>,
}

impl BqConfig {
    /// Enabled BQ with service defaults.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            cache: None,
            rescore_limit: None,
        }
    }
}

/// Scalar quantization (SQ) settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SqConfig {
    /// Whether SQ compression is enabled.
    pub enabled: bool,
    /// Objects used to train the quantizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_limit: Option<u64>,
    /// Candidates re-scored with full vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescore_limit: Option<i64>,
}

/// HNSW index settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HnswConfig {
    /// Distance metric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    /// Dynamic list size during construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ef_construction: Option<u32>,
    /// Maximum connections per node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Dynamic list size during search; `-1` enables dynamic ef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ef: Option<i64>,
    /// Multiplier applied to the limit for dynamic ef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_ef_factor: Option<u32>,
    /// Lower bound for dynamic ef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_ef_min: Option<u32>,
    /// Upper bound for dynamic ef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_ef_max: Option<u32>,
    /// Filter result size below which search falls back to brute force.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_search_cutoff: Option<u64>,
    /// Maximum vectors held in the in-memory cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_cache_max_objects: Option<u64>,
    /// Tombstone cleanup cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_interval_seconds: Option<u64>,
    /// Skip vector indexing entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    /// Product quantization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pq: Option<PqConfig>,
    /// Binary quantization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bq: Option<BqConfig>,
    /// Scalar quantization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sq: Option<SqConfig>,
}

impl HnswConfig {
    /// Names of the quantizers that are switched on.
    #[must_use]
    pub fn enabled_quantizers(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.pq.is_some_and(|pq| pq.enabled) {
            enabled.push("pq");
        }
        if self.bq.is_some_and(|bq| bq.enabled) {
            enabled.push("bq");
        }
        if self.sq.is_some_and(|sq| sq.enabled) {
            enabled.push("sq");
        }
        enabled
    }
}

/// Flat index settings. Only BQ compression is available for flat indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlatConfig {
    /// Distance metric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    /// Maximum vectors held in the in-memory cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_cache_max_objects: Option<u64>,
    /// Binary quantization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bq: Option<BqConfig>,
}

/// Dynamic index settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicConfig {
    /// Distance metric shared by both underlying indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Distance>,
    /// Object count at which the flat index is upgraded to HNSW.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    /// Settings for the HNSW stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hnsw: Option<HnswConfig>,
    /// Settings for the flat stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<FlatConfig>,
}

/// Vector index configuration for one of the index families.
///
/// Serialized untagged: the family travels separately as `vectorIndexType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VectorIndexConfig {
    /// HNSW settings.
    Hnsw(HnswConfig),
    /// Flat settings.
    Flat(FlatConfig),
    /// Dynamic settings.
    Dynamic(DynamicConfig),
}

impl VectorIndexConfig {
    /// Index family of this configuration.
    #[must_use]
    pub const fn index_type(&self) -> VectorIndexType {
        match self {
            Self::Hnsw(_) => VectorIndexType::Hnsw,
            Self::Flat(_) => VectorIndexType::Flat,
            Self::Dynamic(_) => VectorIndexType::Dynamic,
        }
    }

    /// Decode a raw `vectorIndexConfig` object for the given family.
    pub fn from_value(
        index_type: VectorIndexType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match index_type {
            VectorIndexType::Hnsw => Self::Hnsw(serde_json::from_value(value)?),
            VectorIndexType::Flat => Self::Flat(serde_json::from_value(value)?),
            VectorIndexType::Dynamic => Self::Dynamic(serde_json::from_value(value)?),
        })
    }
}

impl From<HnswConfig> for VectorIndexConfig {
    fn from(config: HnswConfig) -> Self {
        Self::Hnsw(config)
    }
}

impl From<FlatConfig> for VectorIndexConfig {
    fn from(config: FlatConfig) -> Self {
        Self::Flat(config)
    }
}

impl From<DynamicConfig> for VectorIndexConfig {
    fn from(config: DynamicConfig) -> Self {
        Self::Dynamic(config)
    }
}
