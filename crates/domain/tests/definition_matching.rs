//! Integration coverage for class definitions, validation and schema matching.

use index_config_domain::{
    Bm25Config, ClassDefinition, ClassName, ClassSnapshot, DataType, DefinitionError, Distance,
    HnswConfig, InvertedIndexConfig, MismatchKind, PqConfig, Property,
    PropertyName, VectorIndexType, match_class, match_payload,
};
use index_config_shared::ErrorEnvelope;
use proptest::prelude::*;
use serde_json::json;
use std::error::Error;

#[test]
fn definition_errors_map_into_error_envelopes() -> Result<(), Box<dyn Error>> {
    let Err(error) = ClassDefinition::builder(ClassName::parse("Docs")?)
        .property(
            Property::new(PropertyName::parse("title")?, DataType::Text)
                .with_index_range_filters(true),
        )
        .build()
    else {
        return Err("expected a property error".into());
    };

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.namespace(), "domain");
    assert_eq!(envelope.code.code(), "invalid_property");
    assert_eq!(envelope.metadata.get("property"), Some(&"title".to_string()));
    assert_eq!(envelope.metadata.get("data_type"), Some(&"text".to_string()));
    Ok(())
}

#[test]
fn returned_class_with_server_defaults_matches_request() -> Result<(), Box<dyn Error>> {
    let definition = ClassDefinition::builder(ClassName::parse("ConfigCollection")?)
        .vector_index_type(VectorIndexType::Hnsw)
        .vector_index_config(HnswConfig {
            distance: Some(Distance::Cosine),
            ef_construction: Some(256),
            max_connections: Some(128),
            pq: Some(PqConfig::enabled()),
            ..HnswConfig::default()
        })
        .inverted_index_config(InvertedIndexConfig {
            bm25: Some(Bm25Config { b: 0.7, k1: 1.25 }),
            ..InvertedIndexConfig::default()
        })
        .build()?;

    let returned = ClassSnapshot::new(json!({
        "class": "ConfigCollection",
        "vectorizer": "none",
        "vectorIndexType": "hnsw",
        "vectorIndexConfig": {
            "distance": "cosine",
            "efConstruction": 256,
            "maxConnections": 128,
            "ef": -1,
            "pq": { "enabled": true, "segments": 0, "centroids": 256 },
            "bq": { "enabled": false }
        },
        "invertedIndexConfig": {
            "bm25": { "b": 0.7, "k1": 1.25 },
            "cleanupIntervalSeconds": 60
        },
        "properties": []
    }));
    assert!(match_class(&definition, &returned)?.is_empty());

    let downgraded = ClassSnapshot::new(json!({
        "class": "ConfigCollection",
        "vectorIndexType": "flat",
        "vectorIndexConfig": { "distance": "cosine" },
        "invertedIndexConfig": { "bm25": { "b": 0.75, "k1": 1.2 } }
    }));
    let mismatches = match_class(&definition, &downgraded)?;
    let paths: Vec<&str> = mismatches.iter().map(|item| item.path.as_str()).collect();
    assert!(paths.contains(&"vectorIndexType"));
    assert!(paths.contains(&"vectorIndexConfig.efConstruction"));
    assert!(paths.contains(&"invertedIndexConfig.bm25.b"));
    assert!(
        mismatches
            .iter()
            .any(|item| matches!(item.kind, MismatchKind::Missing { .. }))
    );
    Ok(())
}

#[test]
fn definition_file_round_trips_through_json() -> Result<(), Box<dyn Error>> {
    let raw = json!({
        "class": "prop_index",
        "vectorizer": "text2vec-huggingface",
        "invertedIndexConfig": {
            "bm25": { "b": 0.7, "k1": 1.25 },
            "indexTimestamps": true
        },
        "properties": [
            {
                "name": "Title",
                "dataType": ["text"],
                "indexFilterable": true,
                "indexSearchable": true,
                "moduleConfig": { "text2vec-huggingface": {} }
            },
            { "name": "chunk", "dataType": ["int"], "indexRangeFilters": true }
        ]
    });
    let definition: ClassDefinition = serde_json::from_value(raw)?;
    definition.validate()?;
    assert_eq!(definition.class.as_str(), "Prop_index");
    assert_eq!(definition.properties[0].name.as_str(), "title");

    let payload = definition.to_payload()?;
    assert!(match_payload(&payload, &payload).is_empty());
    Ok(())
}

#[test]
fn unknown_settings_are_rejected_when_parsing() {
    let parsed = serde_json::from_value::<ClassDefinition>(json!({
        "class": "Docs",
        "vectorIndexConfig": { "efConstructionTypo": 12 }
    }));
    assert!(parsed.is_err());
}

#[test]
fn validation_error_display_names_the_target() {
    let error = DefinitionError::ZeroMaxConnections {
        target: "vectorConfig.title".to_owned(),
    };
    assert_eq!(
        error.to_string(),
        "vectorConfig.title: maxConnections must be greater than zero"
    );
}

proptest! {
    #[test]
    fn class_name_normalizes_first_letter(name in valid_identifier()) {
        let parsed = ClassName::parse(&name);
        prop_assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            prop_assert!(parsed.as_str().starts_with(|ch: char| ch.is_ascii_uppercase()));
            prop_assert_eq!(&parsed.as_str()[1..], &name[1..]);
            prop_assert!(parsed.matches(&name));
        }
    }

    #[test]
    fn payload_matches_itself(
        name in valid_identifier(),
        ef_construction in 1_u32..1024,
        max_connections in 1_u32..256,
        dynamic_ef_min in 1_u32..500,
        dynamic_ef_spread in 0_u32..1000,
        b in 0.0_f64..=1.0,
        k1 in 0.0_f64..4.0,
    ) {
        let class = ClassName::parse(&name);
        prop_assert!(class.is_ok());
        let Ok(class) = class else { return Ok(()); };
        let built = ClassDefinition::builder(class)
            .vector_index_config(HnswConfig {
                ef_construction: Some(ef_construction),
                max_connections: Some(max_connections),
                dynamic_ef_min: Some(dynamic_ef_min),
                dynamic_ef_max: Some(dynamic_ef_min + dynamic_ef_spread),
                ..HnswConfig::default()
            })
            .inverted_index_config(InvertedIndexConfig {
                bm25: Some(Bm25Config { b, k1 }),
                ..InvertedIndexConfig::default()
            })
            .build();
        prop_assert!(built.is_ok());
        let Ok(definition) = built else { return Ok(()); };
        let payload = definition.to_payload();
        prop_assert!(payload.is_ok());
        if let Ok(payload) = payload {
            prop_assert!(match_payload(&payload, &payload).is_empty());
        }
    }
}

fn valid_identifier() -> impl Strategy<Value = String> {
    let start_chars: Vec<char> = ('a'..='z').chain('A'..='Z').collect();
    let mut rest_chars: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    rest_chars.push('_');

    let start = prop::sample::select(start_chars);
    let rest = prop::collection::vec(prop::sample::select(rest_chars), 0..24);

    (start, rest).prop_map(|(start, rest)| {
        let mut name = String::new();
        name.push(start);
        name.extend(rest);
        name
    })
}
