//! Class properties and their per-property index flags.

use crate::primitives::{PropertyName, upper_first};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-module settings, keyed by module name (e.g. `text2vec-huggingface`).
pub type ModuleConfig = BTreeMap<String, serde_json::Value>;

/// Property data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    /// `text`
    Text,
    /// `text[]`
    TextArray,
    /// `int`
    Int,
    /// `int[]`
    IntArray,
    /// `number`
    Number,
    /// `number[]`
    NumberArray,
    /// `boolean`
    Boolean,
    /// `boolean[]`
    BooleanArray,
    /// `date`
    Date,
    /// `date[]`
    DateArray,
    /// `uuid`
    Uuid,
    /// `uuid[]`
    UuidArray,
    /// `geoCoordinates`
    GeoCoordinates,
    /// `phoneNumber`
    PhoneNumber,
    /// `blob`
    Blob,
    /// `object`
    Object,
    /// `object[]`
    ObjectArray,
    /// Cross-reference to another class.
    Reference(String),
}

impl DataType {
    /// Wire string used by the service.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::TextArray => "text[]",
            Self::Int => "int",
            Self::IntArray => "int[]",
            Self::Number => "number",
            Self::NumberArray => "number[]",
            Self::Boolean => "boolean",
            Self::BooleanArray => "boolean[]",
            Self::Date => "date",
            Self::DateArray => "date[]",
            Self::Uuid => "uuid",
            Self::UuidArray => "uuid[]",
            Self::GeoCoordinates => "geoCoordinates",
            Self::PhoneNumber => "phoneNumber",
            Self::Blob => "blob",
            Self::Object => "object",
            Self::ObjectArray => "object[]",
            Self::Reference(class) => class.as_str(),
        }
    }

    /// Returns true for types that support range filter indexes.
    #[must_use]
    pub const fn supports_range_filters(&self) -> bool {
        matches!(self, Self::Int | Self::Number | Self::Date)
    }

    /// Returns true for types that support a searchable (BM25) index.
    #[must_use]
    pub const fn supports_searchable(&self) -> bool {
        matches!(self, Self::Text | Self::TextArray)
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let parsed = match value.as_str() {
            "text" | "string" => Self::Text,
            "text[]" | "string[]" => Self::TextArray,
            "int" => Self::Int,
            "int[]" => Self::IntArray,
            "number" => Self::Number,
            "number[]" => Self::NumberArray,
            "boolean" => Self::Boolean,
            "boolean[]" => Self::BooleanArray,
            "date" => Self::Date,
            "date[]" => Self::DateArray,
            "uuid" => Self::Uuid,
            "uuid[]" => Self::UuidArray,
            "geoCoordinates" => Self::GeoCoordinates,
            "phoneNumber" => Self::PhoneNumber,
            "blob" => Self::Blob,
            "object" => Self::Object,
            "object[]" => Self::ObjectArray,
            other => {
                // Cross-references name a class, which starts with a letter.
                if other.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic())
                    && other.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
                {
                    Self::Reference(upper_first(other))
                } else {
                    return Err(format!("unknown data type `{other}`"));
                }
            },
        };
        Ok(parsed)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Reference(class) => class,
            other => other.as_wire().to_owned(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_wire())
    }
}

/// Tokenization applied to text properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
    /// Alphanumeric words, lower-cased.
    Word,
    /// Whitespace split, lower-cased.
    Lowercase,
    /// Whitespace split, case preserved.
    Whitespace,
    /// The whole value as one token.
    Field,
    /// Character trigrams.
    Trigram,
    /// Dictionary-based segmentation for CJK text.
    Gse,
}

/// A class property with its indexing flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Property {
    /// Property name.
    pub name: PropertyName,
    /// Data type (single element, or several class names for cross-references).
    pub data_type: Vec<DataType>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Build the filterable (roaring bitmap) index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_filterable: Option<bool>,
    /// Build the searchable (BM25) index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_searchable: Option<bool>,
    /// Build the range filter index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_range_filters: Option<bool>,
    /// Text tokenization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenization: Option<Tokenization>,
    /// Per-module settings for this property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_config: Option<ModuleConfig>,
}

impl Property {
    /// Create a property with a single data type and no index flags.
    #[must_use]
    pub fn new(name: PropertyName, data_type: DataType) -> Self {
        Self {
            name,
            data_type: vec![data_type],
            description: None,
            index_filterable: None,
            index_searchable: None,
            index_range_filters: None,
            tokenization: None,
            module_config: None,
        }
    }

    /// Set the filterable index flag.
    #[must_use]
    pub const fn with_index_filterable(mut self, enabled: bool) -> Self {
        self.index_filterable = Some(enabled);
        self
    }

    /// Set the searchable index flag.
    #[must_use]
    pub const fn with_index_searchable(mut self, enabled: bool) -> Self {
        self.index_searchable = Some(enabled);
        self
    }

    /// Set the range filter index flag.
    #[must_use]
    pub const fn with_index_range_filters(mut self, enabled: bool) -> Self {
        self.index_range_filters = Some(enabled);
        self
    }

    /// Set the tokenization.
    #[must_use]
    pub const fn with_tokenization(mut self, tokenization: Tokenization) -> Self {
        self.tokenization = Some(tokenization);
        self
    }

    /// Attach settings for a module.
    #[must_use]
    pub fn with_module_config(
        mut self,
        module: impl Into<String>,
        settings: serde_json::Value,
    ) -> Self {
        self.module_config
            .get_or_insert_with(ModuleConfig::new)
            .insert(module.into(), settings);
        self
    }
}
