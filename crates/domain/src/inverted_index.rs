//! Inverted index settings: BM25 parameters, stopwords, and metadata indexing.

use serde::{Deserialize, Serialize};

/// BM25 ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bm25Config {
    /// Length normalization, `0.0..=1.0`.
    pub b: f64,
    /// Term frequency saturation, `>= 0.0`.
    pub k1: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { b: 0.75, k1: 1.2 }
    }
}

/// Built-in stopword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordPreset {
    /// English stopwords.
    En,
    /// No stopwords.
    None,
}

/// Stopword configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StopwordsConfig {
    /// Base preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<StopwordPreset>,
    /// Words added to the preset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<String>,
    /// Words removed from the preset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removals: Vec<String>,
}

/// Class-level inverted index settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvertedIndexConfig {
    /// BM25 parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm25: Option<Bm25Config>,
    /// Stopwords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<StopwordsConfig>,
    /// Index creation/update timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_timestamps: Option<bool>,
    /// Index null state so `IsNull` filters work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_null_state: Option<bool>,
    /// Index property lengths so length filters work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_property_length: Option<bool>,
    /// Tombstone cleanup cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_interval_seconds: Option<u64>,
}
