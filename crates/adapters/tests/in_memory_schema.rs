//! In-memory schema adapter behaviour.

use index_config_adapters::InMemorySchema;
use index_config_domain::{
    ClassDefinition, ClassName, DataType, NamedVector, Property, PropertyName, VectorIndexType,
    match_class,
};
use index_config_ports::{SchemaPort, schema_codes};
use index_config_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::json;

fn class(name: &str) -> Result<ClassName> {
    ClassName::parse(name).map_err(ErrorEnvelope::from)
}

fn property(name: &str) -> Result<PropertyName> {
    PropertyName::parse(name).map_err(ErrorEnvelope::from)
}

#[tokio::test]
async fn stored_class_matches_the_request() -> Result<()> {
    let adapter = InMemorySchema::new();
    let ctx = RequestContext::new_request();
    let definition = ClassDefinition::builder(class("Articles")?)
        .property(
            Property::new(property("title")?, DataType::Text).with_index_filterable(true),
        )
        .property(Property::new(property("chunk")?, DataType::Int).with_index_range_filters(true))
        .build()
        .map_err(ErrorEnvelope::from)?;

    adapter.create_class(&ctx, definition.clone()).await?;

    let schema = adapter.get_schema(&ctx).await?;
    assert_eq!(schema.class_names(), vec!["Articles"]);

    let Some(snapshot) = adapter.get_class(&ctx, class("articles")?).await? else {
        return Err(ErrorEnvelope::expected(schema_codes::class_missing(), "missing"));
    };
    assert!(match_class(&definition, &snapshot)?.is_empty());

    let properties = &snapshot.as_value()["properties"];
    assert_eq!(properties[0]["tokenization"], json!("word"));
    assert_eq!(properties[1]["indexSearchable"], json!(false));
    assert_eq!(properties[1]["indexRangeFilters"], json!(true));
    Ok(())
}

#[tokio::test]
async fn named_vectors_get_per_vector_defaults() -> Result<()> {
    let adapter = InMemorySchema::new();
    let ctx = RequestContext::new_request();
    let definition = ClassDefinition::builder(class("Multi")?)
        .named_vector(property("title")?, NamedVector::new(VectorIndexType::Hnsw))
        .named_vector(property("body")?, NamedVector::new(VectorIndexType::Flat))
        .build()
        .map_err(ErrorEnvelope::from)?;

    adapter.create_class(&ctx, definition).await?;
    let Some(snapshot) = adapter.get_class(&ctx, class("Multi")?).await? else {
        return Err(ErrorEnvelope::expected(schema_codes::class_missing(), "missing"));
    };

    assert_eq!(snapshot.vector_index_type(), None);
    assert_eq!(
        snapshot.named_vector_index_type("title"),
        Some(VectorIndexType::Hnsw)
    );
    assert_eq!(
        snapshot.named_vector_index_type("body"),
        Some(VectorIndexType::Flat)
    );
    assert_eq!(
        snapshot.as_value()["vectorConfig"]["title"]["vectorIndexConfig"]["distance"],
        json!("cosine")
    );
    Ok(())
}

#[tokio::test]
async fn invalid_definitions_are_rejected_as_invalid_class() -> Result<()> {
    let adapter = InMemorySchema::new();
    let ctx = RequestContext::new_request();
    let definition = ClassDefinition::builder(class("Broken")?)
        .property(Property::new(property("title")?, DataType::Text).with_index_range_filters(true))
        .build_unchecked();

    let error = adapter.create_class(&ctx, definition).await.err();
    assert_eq!(error.map(|error| error.code), Some(schema_codes::invalid_class()));
    assert!(adapter.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn raw_overrides_are_returned_verbatim() -> Result<()> {
    let adapter = InMemorySchema::new();
    let ctx = RequestContext::new_request();
    adapter
        .put_raw(class("Legacy")?, json!({ "class": "Legacy", "vectorIndexType": "flat" }))
        .await;

    assert!(adapter.class_exists(&ctx, class("Legacy")?).await?);
    let snapshot = adapter.get_class(&ctx, class("Legacy")?).await?;
    assert_eq!(
        snapshot.and_then(|snapshot| snapshot.vector_index_type()),
        Some(VectorIndexType::Flat)
    );
    Ok(())
}
