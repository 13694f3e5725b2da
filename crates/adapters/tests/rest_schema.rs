//! REST schema adapter tests against a mock server.

use index_config_adapters::{WeaviateRestConfig, WeaviateRestSchema};
use index_config_domain::{ClassDefinition, ClassName, HnswConfig, VectorIndexType};
use index_config_ports::{SchemaPort, schema_codes};
use index_config_shared::{ErrorClass, ErrorEnvelope, RequestContext, Result, RetryPolicy, SecretString};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_ratio_pct: 0,
    }
}

fn adapter_for(server: &MockServer, retry: RetryPolicy) -> Result<WeaviateRestSchema> {
    WeaviateRestSchema::new(WeaviateRestConfig {
        url: server.uri().into(),
        api_key: None,
        additional_headers: BTreeMap::new(),
        timeout_ms: 5_000,
        retry,
    })
}

fn class(name: &str) -> Result<ClassName> {
    ClassName::parse(name).map_err(ErrorEnvelope::from)
}

#[tokio::test]
async fn get_schema_sends_auth_and_provider_headers() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema"))
        .and(header("authorization", "Bearer example"))
        .and(header("x-cohere-api-key", "cohere-example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "classes": [
                { "class": "Docs", "vectorIndexType": "hnsw" },
                { "class": "Notes", "vectorIndexType": "flat" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert(
        Box::<str>::from("X-Cohere-Api-Key"),
        SecretString::new("cohere-example"),
    );
    let adapter = WeaviateRestSchema::new(WeaviateRestConfig {
        url: format!("{}/v1/", server.uri()).into(),
        api_key: Some(SecretString::new("example")), // pragma: allowlist secret
        additional_headers: headers,
        timeout_ms: 5_000,
        retry: RetryPolicy::none(),
    })?;

    let schema = adapter.get_schema(&RequestContext::new_request()).await?;
    assert_eq!(schema.class_names(), vec!["Docs", "Notes"]);
    assert!(schema.contains(&class("notes")?));
    Ok(())
}

#[tokio::test]
async fn missing_class_is_absent_not_an_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema/Ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    let ctx = RequestContext::new_request();
    assert!(!adapter.class_exists(&ctx, class("Ghost")?).await?);
    assert!(adapter.get_class(&ctx, class("ghost")?).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn get_class_returns_raw_snapshot() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema/Docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "class": "Docs",
            "vectorIndexType": "dynamic",
            "vectorIndexConfig": { "threshold": 10000, "futureSetting": true }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, RetryPolicy::none())?;
    let ctx = RequestContext::new_request();
    let snapshot = adapter.get_class(&ctx, class("Docs")?).await?;
    let Some(snapshot) = snapshot else {
        return Err(ErrorEnvelope::expected(
            schema_codes::class_missing(),
            "expected a snapshot",
        ));
    };
    assert_eq!(snapshot.vector_index_type(), Some(VectorIndexType::Dynamic));
    assert_eq!(
        snapshot.as_value()["vectorIndexConfig"]["futureSetting"],
        json!(true)
    );
    assert!(adapter.class_exists(&ctx, class("Docs")?).await?);
    Ok(())
}

#[tokio::test]
async fn create_class_posts_the_payload() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .and(body_json(json!({
            "class": "Docs",
            "vectorIndexType": "hnsw",
            "vectorIndexConfig": { "efConstruction": 256, "maxConnections": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "class": "Docs" })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, RetryPolicy::none())?;
    let definition = ClassDefinition::builder(class("Docs")?)
        .vector_index_config(HnswConfig {
            ef_construction: Some(256),
            max_connections: Some(64),
            ..HnswConfig::default()
        })
        .build()
        .map_err(ErrorEnvelope::from)?;
    adapter
        .create_class(&RequestContext::new_request(), definition)
        .await
}

#[tokio::test]
async fn duplicate_create_maps_to_class_exists() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": [{ "message": "class name \"Docs\" already exists" }]
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    let definition = ClassDefinition::builder(class("Docs")?).build_unchecked();
    let error = adapter
        .create_class(&RequestContext::new_request(), definition)
        .await
        .err();
    let Some(error) = error else {
        return Err(ErrorEnvelope::expected(schema_codes::unknown(), "expected failure"));
    };
    assert_eq!(error.code, schema_codes::class_exists());
    assert_eq!(error.message, "class name \"Docs\" already exists");
    Ok(())
}

#[tokio::test]
async fn create_is_not_retried_on_server_errors() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    let definition = ClassDefinition::builder(class("Docs")?).build_unchecked();
    let error = adapter
        .create_class(&RequestContext::new_request(), definition)
        .await
        .err();
    assert_eq!(error.as_ref().map(|error| &error.code), Some(&schema_codes::server()));
    assert_eq!(
        error.map(|error| error.class),
        Some(ErrorClass::Retriable)
    );
    Ok(())
}

#[tokio::test]
async fn delete_retries_transient_failures() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Docs"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Docs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    adapter
        .delete_class(&RequestContext::new_request(), class("Docs")?)
        .await
}

#[tokio::test]
async fn deleting_a_missing_class_succeeds() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, RetryPolicy::none())?;
    adapter
        .delete_class(&RequestContext::new_request(), class("Ghost")?)
        .await
}

#[tokio::test]
async fn unauthorized_maps_to_auth() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": [{ "message": "anonymous access not enabled" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    let error = adapter.get_schema(&RequestContext::new_request()).await.err();
    assert_eq!(error.as_ref().map(|error| &error.code), Some(&schema_codes::auth()));
    assert_eq!(
        error
            .as_ref()
            .and_then(|error| error.metadata.get("attempts"))
            .map(String::as_str),
        Some("1")
    );
    Ok(())
}

#[tokio::test]
async fn slow_responses_time_out() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "classes": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let adapter = WeaviateRestSchema::new(WeaviateRestConfig {
        url: server.uri().into(),
        api_key: None,
        additional_headers: BTreeMap::new(),
        timeout_ms: 50,
        retry: RetryPolicy::none(),
    })?;
    let error = adapter.get_schema(&RequestContext::new_request()).await.err();
    assert_eq!(error.map(|error| error.code), Some(schema_codes::timeout()));
    Ok(())
}

#[tokio::test]
async fn cancelled_context_sends_nothing() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, fast_retry(3))?;
    let ctx = RequestContext::new_request();
    ctx.cancel();
    let error = adapter.get_schema(&ctx).await.err();
    assert!(error.is_some_and(|error| error.is_cancelled()));
    Ok(())
}

#[tokio::test]
async fn malformed_schema_body_is_invalid_response() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, RetryPolicy::none())?;
    let error = adapter.get_schema(&RequestContext::new_request()).await.err();
    assert_eq!(
        error.map(|error| error.code),
        Some(schema_codes::invalid_response())
    );
    Ok(())
}
