//! Class (collection) definitions and the schema shapes returned by the service.

use crate::inverted_index::InvertedIndexConfig;
use crate::primitives::{ClassName, PropertyName};
use crate::property::{ModuleConfig, Property};
use crate::validation::{DefinitionError, validate_definition};
use crate::vector_index::{VectorIndexConfig, VectorIndexType};
use index_config_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named vector ("multiple vectors") attached to a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawNamedVector")]
pub struct NamedVector {
    /// Vectorizer module and its settings, e.g. `{"text2vec-cohere": {...}}`.
    pub vectorizer: ModuleConfig,
    /// Index family for this vector.
    pub vector_index_type: VectorIndexType,
    /// Index settings for this vector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_index_config: Option<VectorIndexConfig>,
}

impl NamedVector {
    /// Named vector without a vectorizer ("bring your own vectors").
    #[must_use]
    pub fn new(vector_index_type: VectorIndexType) -> Self {
        let mut vectorizer = ModuleConfig::new();
        vectorizer.insert("none".to_owned(), serde_json::json!({}));
        Self {
            vectorizer,
            vector_index_type,
            vector_index_config: None,
        }
    }

    /// Replace the vectorizer with a module and its settings.
    #[must_use]
    pub fn vectorizer(mut self, module: impl Into<String>, settings: serde_json::Value) -> Self {
        self.vectorizer = ModuleConfig::from([(module.into(), settings)]);
        self
    }

    /// Set index settings. The index type follows the settings.
    #[must_use]
    pub fn index_config(mut self, config: impl Into<VectorIndexConfig>) -> Self {
        let config = config.into();
        self.vector_index_type = config.index_type();
        self.vector_index_config = Some(config);
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawNamedVector {
    #[serde(default)]
    vectorizer: ModuleConfig,
    #[serde(default)]
    vector_index_type: Option<VectorIndexType>,
    #[serde(default)]
    vector_index_config: Option<serde_json::Value>,
}

impl TryFrom<RawNamedVector> for NamedVector {
    type Error = String;

    fn try_from(raw: RawNamedVector) -> Result<Self, Self::Error> {
        let vector_index_type = raw.vector_index_type.unwrap_or(VectorIndexType::Hnsw);
        let vector_index_config = raw
            .vector_index_config
            .map(|value| VectorIndexConfig::from_value(vector_index_type, value))
            .transpose()
            .map_err(|error| format!("invalid vectorIndexConfig: {error}"))?;
        Ok(Self {
            vectorizer: raw.vectorizer,
            vector_index_type,
            vector_index_config,
        })
    }
}

/// Definition of a class as sent to the create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawClassDefinition")]
pub struct ClassDefinition {
    /// Class name.
    pub class: ClassName,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Class-level vectorizer module (e.g. `text2vec-huggingface`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,
    /// Class-level module settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config: Option<ModuleConfig>,
    /// Index family; the service defaults to HNSW.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_index_type: Option<VectorIndexType>,
    /// Index settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_index_config: Option<VectorIndexConfig>,
    /// Named vectors, keyed by vector name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vector_config: BTreeMap<PropertyName, NamedVector>,
    /// Inverted index settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverted_index_config: Option<InvertedIndexConfig>,
    /// Properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

impl ClassDefinition {
    /// Start building a definition for `class`.
    #[must_use]
    pub fn builder(class: ClassName) -> ClassDefinitionBuilder {
        ClassDefinitionBuilder {
            definition: Self {
                class,
                description: None,
                vectorizer: None,
                module_config: None,
                vector_index_type: None,
                vector_index_config: None,
                vector_config: BTreeMap::new(),
                inverted_index_config: None,
                properties: Vec::new(),
            },
        }
    }

    /// Index family the service will use for the class-level vector.
    ///
    /// Falls back to the settings' family, then to HNSW.
    #[must_use]
    pub fn effective_index_type(&self) -> VectorIndexType {
        self.vector_index_type
            .or_else(|| self.vector_index_config.map(|config| config.index_type()))
            .unwrap_or(VectorIndexType::Hnsw)
    }

    /// Returns true when the class uses named vectors.
    #[must_use]
    pub fn has_named_vectors(&self) -> bool {
        !self.vector_config.is_empty()
    }

    /// Validate definition invariants.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        validate_definition(self)
    }

    /// JSON payload for the create endpoint.
    ///
    /// When settings are present without an explicit type, the type is
    /// emitted from the settings so the service does not default to HNSW.
    pub fn to_payload(&self) -> Result<serde_json::Value, ErrorEnvelope> {
        let mut payload = serde_json::to_value(self).map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::new("domain", "payload_encode"),
                format!("failed to encode class definition: {error}"),
            )
            .with_metadata("class", self.class.as_str())
        })?;
        if self.vector_index_type.is_none()
            && let Some(config) = self.vector_index_config
            && let Some(object) = payload.as_object_mut()
        {
            object.insert(
                "vectorIndexType".to_owned(),
                serde_json::Value::String(config.index_type().as_str().to_owned()),
            );
        }
        Ok(payload)
    }
}

/// Builder for `ClassDefinition`.
#[derive(Debug, Clone)]
pub struct ClassDefinitionBuilder {
    definition: ClassDefinition,
}

impl ClassDefinitionBuilder {
    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = Some(description.into());
        self
    }

    /// Set the class-level vectorizer module.
    #[must_use]
    pub fn vectorizer(mut self, module: impl Into<String>) -> Self {
        self.definition.vectorizer = Some(module.into());
        self
    }

    /// Attach class-level settings for a module.
    #[must_use]
    pub fn module_config(mut self, module: impl Into<String>, settings: serde_json::Value) -> Self {
        self.definition
            .module_config
            .get_or_insert_with(ModuleConfig::new)
            .insert(module.into(), settings);
        self
    }

    /// Set the index family.
    #[must_use]
    pub const fn vector_index_type(mut self, index_type: VectorIndexType) -> Self {
        self.definition.vector_index_type = Some(index_type);
        self
    }

    /// Set the index settings (the family is inferred when not set explicitly).
    #[must_use]
    pub fn vector_index_config(mut self, config: impl Into<VectorIndexConfig>) -> Self {
        self.definition.vector_index_config = Some(config.into());
        self
    }

    /// Add a named vector.
    #[must_use]
    pub fn named_vector(mut self, name: PropertyName, vector: NamedVector) -> Self {
        self.definition.vector_config.insert(name, vector);
        self
    }

    /// Set the inverted index settings.
    #[must_use]
    pub fn inverted_index_config(mut self, config: InvertedIndexConfig) -> Self {
        self.definition.inverted_index_config = Some(config);
        self
    }

    /// Add a property.
    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.definition.properties.push(property);
        self
    }

    /// Build a validated `ClassDefinition`.
    pub fn build(self) -> Result<ClassDefinition, DefinitionError> {
        self.definition.validate()?;
        Ok(self.definition)
    }

    /// Build without validation, for exercising server-side rejections.
    #[must_use]
    pub fn build_unchecked(self) -> ClassDefinition {
        self.definition
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawClassDefinition {
    class: ClassName,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    vectorizer: Option<String>,
    #[serde(default)]
    module_config: Option<ModuleConfig>,
    #[serde(default)]
    vector_index_type: Option<VectorIndexType>,
    #[serde(default)]
    vector_index_config: Option<serde_json::Value>,
    #[serde(default)]
    vector_config: BTreeMap<PropertyName, NamedVector>,
    #[serde(default)]
    inverted_index_config: Option<InvertedIndexConfig>,
    #[serde(default)]
    properties: Vec<Property>,
}

impl TryFrom<RawClassDefinition> for ClassDefinition {
    type Error = String;

    fn try_from(raw: RawClassDefinition) -> Result<Self, Self::Error> {
        let settings_type = raw.vector_index_type.unwrap_or(VectorIndexType::Hnsw);
        let vector_index_config = raw
            .vector_index_config
            .map(|value| VectorIndexConfig::from_value(settings_type, value))
            .transpose()
            .map_err(|error| format!("invalid vectorIndexConfig for `{settings_type}`: {error}"))?;
        Ok(Self {
            class: raw.class,
            description: raw.description,
            vectorizer: raw.vectorizer,
            module_config: raw.module_config,
            vector_index_type: raw.vector_index_type,
            vector_index_config,
            vector_config: raw.vector_config,
            inverted_index_config: raw.inverted_index_config,
            properties: raw.properties,
        })
    }
}

/// A class exactly as the service returned it.
///
/// Kept as raw JSON so fields this crate does not model survive matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassSnapshot(serde_json::Value);

impl ClassSnapshot {
    /// Wrap a raw class object.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Raw JSON.
    #[must_use]
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume into raw JSON.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// The `class` field, if present.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.0.get("class").and_then(serde_json::Value::as_str)
    }

    /// The `vectorIndexType` field, if present and known.
    #[must_use]
    pub fn vector_index_type(&self) -> Option<VectorIndexType> {
        self.0
            .get("vectorIndexType")
            .and_then(serde_json::Value::as_str)
            .and_then(VectorIndexType::from_wire)
    }

    /// Index type of a named vector, if present and known.
    #[must_use]
    pub fn named_vector_index_type(&self, vector: &str) -> Option<VectorIndexType> {
        self.0
            .get("vectorConfig")
            .and_then(|config| config.get(vector))
            .and_then(|entry| entry.get("vectorIndexType"))
            .and_then(serde_json::Value::as_str)
            .and_then(VectorIndexType::from_wire)
    }
}

impl From<serde_json::Value> for ClassSnapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Wire shape of the full schema listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Classes on the service.
    #[serde(default)]
    pub classes: Vec<ClassSnapshot>,
}

impl Schema {
    /// Names of all listed classes.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.classes
            .iter()
            .filter_map(ClassSnapshot::class_name)
            .collect()
    }

    /// Returns true when `class` is listed.
    #[must_use]
    pub fn contains(&self, class: &ClassName) -> bool {
        self.find(class).is_some()
    }

    /// Find a listed class by name.
    #[must_use]
    pub fn find(&self, class: &ClassName) -> Option<&ClassSnapshot> {
        self.classes
            .iter()
            .find(|snapshot| snapshot.class_name().is_some_and(|name| class.matches(name)))
    }
}
