//! Process-local schema adapter.
//!
//! Stores classes in memory and echoes them back the way the service does:
//! every setting the request left out is filled in with the server default.

use index_config_domain::{ClassDefinition, ClassName, ClassSnapshot, DataType, Schema};
use index_config_ports::{BoxFuture, SchemaPort, SchemaProviderInfo, schema_codes};
use index_config_shared::{ErrorClass, ErrorEnvelope, RequestContext, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory `SchemaPort` used for tests and offline runs.
#[derive(Clone)]
pub struct InMemorySchema {
    provider: SchemaProviderInfo,
    classes: Arc<RwLock<BTreeMap<ClassName, Value>>>,
}

impl Default for InMemorySchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchema {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: SchemaProviderInfo {
                id: "in_memory".into(),
                name: "In-memory schema".into(),
            },
            classes: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored classes.
    pub async fn len(&self) -> usize {
        self.classes.read().await.len()
    }

    /// Returns true when no class is stored.
    pub async fn is_empty(&self) -> bool {
        self.classes.read().await.is_empty()
    }

    /// Overwrite a stored class object as-is, bypassing default filling.
    ///
    /// Lets tests simulate a server that ignored or rewrote settings.
    pub async fn put_raw(&self, class: ClassName, value: Value) {
        self.classes.write().await.insert(class, value);
    }
}

impl SchemaPort for InMemorySchema {
    fn provider(&self) -> &SchemaProviderInfo {
        &self.provider
    }

    fn class_exists(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory.class_exists")?;
            Ok(self.classes.read().await.contains_key(&class))
        })
    }

    fn get_schema(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Schema>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory.get_schema")?;
            let classes = self
                .classes
                .read()
                .await
                .values()
                .cloned()
                .map(ClassSnapshot::new)
                .collect();
            Ok(Schema { classes })
        })
    }

    fn get_class(
        &self,
        ctx: &RequestContext,
        class: ClassName,
    ) -> BoxFuture<'_, Result<Option<ClassSnapshot>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory.get_class")?;
            Ok(self
                .classes
                .read()
                .await
                .get(&class)
                .cloned()
                .map(ClassSnapshot::new))
        })
    }

    fn create_class(
        &self,
        ctx: &RequestContext,
        definition: ClassDefinition,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory.create_class")?;
            definition.validate().map_err(|error| {
                let envelope: ErrorEnvelope = error.into();
                ErrorEnvelope::unexpected(
                    schema_codes::invalid_class(),
                    envelope.message,
                    ErrorClass::NonRetriable,
                )
                .with_metadata("class", definition.class.as_str())
            })?;
            let stored = with_server_defaults(&definition)?;

            let mut classes = self.classes.write().await;
            if classes.contains_key(&definition.class) {
                return Err(ErrorEnvelope::unexpected(
                    schema_codes::class_exists(),
                    format!("class name {:?} already exists", definition.class.as_str()),
                    ErrorClass::NonRetriable,
                )
                .with_metadata("class", definition.class.as_str()));
            }
            classes.insert(definition.class, stored);
            Ok(())
        })
    }

    fn delete_class(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("in_memory.delete_class")?;
            self.classes.write().await.remove(&class);
            Ok(())
        })
    }
}

/// The class object the service would return for `definition`.
pub fn with_server_defaults(definition: &ClassDefinition) -> Result<Value> {
    let mut payload = definition.to_payload()?;
    let Some(object) = payload.as_object_mut() else {
        return Ok(payload);
    };

    object
        .entry("vectorizer")
        .or_insert_with(|| Value::from("none"));
    object
        .entry("moduleConfig")
        .or_insert_with(|| json!({}));

    if definition.has_named_vectors() {
        if let Some(Value::Object(named)) = object.get_mut("vectorConfig") {
            for entry in named.values_mut() {
                fill_vector_defaults(entry);
            }
        }
    } else {
        let index_type = definition.effective_index_type();
        object.insert(
            "vectorIndexType".to_owned(),
            Value::from(index_type.as_str()),
        );
        let config = object
            .entry("vectorIndexConfig")
            .or_insert_with(|| json!({}));
        fill_missing(config, &index_defaults(index_type.as_str()));
    }

    let inverted = object
        .entry("invertedIndexConfig")
        .or_insert_with(|| json!({}));
    fill_missing(inverted, &inverted_index_defaults());

    let properties = object
        .entry("properties")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = properties {
        for (item, property) in items.iter_mut().zip(&definition.properties) {
            let is_text = property
                .data_type
                .iter()
                .any(DataType::supports_searchable);
            fill_missing(item, &property_defaults(is_text));
        }
    }

    Ok(payload)
}

fn fill_vector_defaults(entry: &mut Value) {
    let index_type = entry
        .get("vectorIndexType")
        .and_then(Value::as_str)
        .unwrap_or("hnsw")
        .to_owned();
    if let Value::Object(map) = entry {
        map.insert("vectorIndexType".to_owned(), Value::from(index_type.as_str()));
        let config = map
            .entry("vectorIndexConfig")
            .or_insert_with(|| json!({}));
        fill_missing(config, &index_defaults(&index_type));
    }
}

/// Insert every key of `defaults` that `target` lacks, recursing into objects.
fn fill_missing(target: &mut Value, defaults: &Value) {
    let (Value::Object(target_map), Value::Object(default_map)) = (target, defaults) else {
        return;
    };
    for (key, default_value) in default_map {
        match target_map.get_mut(key) {
            Some(existing) => fill_missing(existing, default_value),
            None => {
                target_map.insert(key.clone(), default_value.clone());
            },
        }
    }
}

fn hnsw_defaults() -> Value {
    json!({
        "distance": "cosine",
        "ef": -1,
        "efConstruction": 128,
        "maxConnections": 32,
        "dynamicEfFactor": 8,
        "dynamicEfMin": 100,
        "dynamicEfMax": 500,
        "flatSearchCutoff": 40_000,
        "vectorCacheMaxObjects": 1_000_000_000_000_u64,
        "cleanupIntervalSeconds": 300,
        "skip": false,
        "pq": {
            "enabled": false,
            "bitCompression": false,
            "segments": 0,
            "centroids": 256,
            "trainingLimit": 100_000,
            "encoder": { "type": "kmeans", "distribution": "log-normal" }
        },
        "bq": { "enabled": false },
        "sq": { "enabled": false, "trainingLimit": 100_000, "rescoreLimit": 20 }
    })
}

fn flat_defaults() -> Value {
    json!({
        "distance": "cosine",
        "vectorCacheMaxObjects": 1_000_000_000_000_u64,
        "pq": { "enabled": false, "rescoreLimit": -1, "cache": false },
        "bq": { "enabled": false, "rescoreLimit": -1, "cache": false }
    })
}

fn index_defaults(index_type: &str) -> Value {
    match index_type {
        "flat" => flat_defaults(),
        "dynamic" => json!({
            "distance": "cosine",
            "threshold": 10_000,
            "hnsw": hnsw_defaults(),
            "flat": flat_defaults()
        }),
        _ => hnsw_defaults(),
    }
}

fn inverted_index_defaults() -> Value {
    json!({
        "bm25": { "b": 0.75, "k1": 1.2 },
        "cleanupIntervalSeconds": 60,
        "stopwords": { "preset": "en", "additions": null, "removals": null },
        "indexTimestamps": false,
        "indexNullState": false,
        "indexPropertyLength": false
    })
}

fn property_defaults(is_text: bool) -> Value {
    if is_text {
        json!({
            "indexFilterable": true,
            "indexSearchable": true,
            "indexRangeFilters": false,
            "tokenization": "word"
        })
    } else {
        json!({
            "indexFilterable": true,
            "indexSearchable": false,
            "indexRangeFilters": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_config_domain::{FlatConfig, HnswConfig, VectorIndexType};

    fn name(value: &str) -> Result<ClassName> {
        ClassName::parse(value).map_err(ErrorEnvelope::from)
    }

    #[test]
    fn defaults_fill_gaps_without_overriding_requested_values() -> Result<()> {
        let definition = ClassDefinition::builder(name("Docs")?)
            .vector_index_config(HnswConfig {
                ef_construction: Some(256),
                ..HnswConfig::default()
            })
            .build_unchecked();
        let stored = with_server_defaults(&definition)?;

        assert_eq!(stored["vectorIndexType"], json!("hnsw"));
        assert_eq!(stored["vectorIndexConfig"]["efConstruction"], json!(256));
        assert_eq!(stored["vectorIndexConfig"]["maxConnections"], json!(32));
        assert_eq!(stored["invertedIndexConfig"]["bm25"]["k1"], json!(1.2));
        Ok(())
    }

    #[test]
    fn flat_type_gets_flat_defaults() -> Result<()> {
        let definition = ClassDefinition::builder(name("Docs")?)
            .vector_index_type(VectorIndexType::Flat)
            .vector_index_config(FlatConfig::default())
            .build_unchecked();
        let stored = with_server_defaults(&definition)?;
        assert_eq!(stored["vectorIndexType"], json!("flat"));
        assert!(stored["vectorIndexConfig"].get("efConstruction").is_none());
        assert_eq!(stored["vectorIndexConfig"]["bq"]["enabled"], json!(false));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() -> Result<()> {
        let adapter = InMemorySchema::new();
        let ctx = RequestContext::new_request();
        let definition = ClassDefinition::builder(name("Docs")?).build_unchecked();

        adapter.create_class(&ctx, definition.clone()).await?;
        let error = adapter.create_class(&ctx, definition).await.err();
        assert_eq!(error.map(|error| error.code), Some(schema_codes::class_exists()));
        assert_eq!(adapter.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_missing_class_is_a_no_op() -> Result<()> {
        let adapter = InMemorySchema::new();
        let ctx = RequestContext::new_request();
        adapter.delete_class(&ctx, name("Ghost")?).await?;
        assert!(adapter.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() -> Result<()> {
        let adapter = InMemorySchema::new();
        let ctx = RequestContext::new_request();
        ctx.cancel();
        let error = adapter.get_schema(&ctx).await.err();
        assert!(error.is_some_and(|error| error.is_cancelled()));
        Ok(())
    }
}
