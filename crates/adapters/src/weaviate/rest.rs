//! REST adapter for the vector database schema endpoints.

use crate::weaviate::auth::{RestAuthInput, build_default_headers};
use crate::weaviate::base_url::to_rest_base_url;
use crate::weaviate::error::{
    PROVIDER_ID, SchemaErrorContext, cancelled_error, invalid_response_error, map_rest_error,
    map_rest_transport_error, timeout_error,
};
use index_config_config::ClientConfig;
use index_config_domain::{ClassDefinition, ClassName, ClassSnapshot, Schema};
use index_config_ports::{BoxFuture, SchemaPort, SchemaProviderInfo};
use index_config_shared::{
    ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, RetryPolicy, SecretString,
    retry_async_with_observer,
};
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// REST adapter configuration.
#[derive(Debug, Clone)]
pub struct WeaviateRestConfig {
    /// Service address; scheme and `/v1` suffix are optional.
    pub url: Box<str>,
    /// Optional API key sent as a bearer token.
    pub api_key: Option<SecretString>,
    /// Extra headers sent on every request.
    pub additional_headers: BTreeMap<Box<str>, SecretString>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retry policy for idempotent calls (GET/DELETE).
    pub retry: RetryPolicy,
}

impl WeaviateRestConfig {
    /// Validates configuration invariants for the REST adapter.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "vector database URL is required",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "retry attempts must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl From<&ClientConfig> for WeaviateRestConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            url: config.connection.url.clone(),
            api_key: config.connection.api_key.clone(),
            additional_headers: config.connection.additional_headers.clone(),
            timeout_ms: config.connection.timeout_ms,
            retry: config.retry.to_policy(),
        }
    }
}

struct RestReply {
    status: u16,
    body: Vec<u8>,
}

/// Schema adapter speaking the service's `/v1/schema` REST API.
#[derive(Clone)]
pub struct WeaviateRestSchema {
    provider: SchemaProviderInfo,
    client: reqwest::Client,
    base_url: Box<str>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl WeaviateRestSchema {
    /// Creates an adapter instance from configuration.
    pub fn new(config: WeaviateRestConfig) -> Result<Self> {
        config.validate()?;
        let base_url = to_rest_base_url(&config.url)?;
        let headers = build_default_headers(&RestAuthInput {
            api_key: config.api_key.as_ref(),
            additional_headers: &config.additional_headers,
        })?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("schema", "client_init_failed"),
                    format!("failed to build REST client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            provider: SchemaProviderInfo {
                id: PROVIDER_ID.into(),
                name: "Weaviate REST".into(),
            },
            client,
            base_url,
            timeout,
            retry: config.retry,
        })
    }

    /// Normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn context(
        operation: &'static str,
        class: Option<&ClassName>,
        endpoint: &str,
    ) -> SchemaErrorContext {
        SchemaErrorContext {
            operation,
            class_name: class.map(|class| class.as_str().to_owned()),
            endpoint: endpoint.to_owned(),
        }
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        err_ctx: &SchemaErrorContext,
    ) -> Result<RestReply> {
        ctx.ensure_not_cancelled(err_ctx.operation)?;
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(
            operation = err_ctx.operation,
            method = %method,
            url = %url,
            "sending schema request"
        );

        let request = self.client.request(method, &url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(err_ctx.operation)),
            res = tokio::time::timeout(self.timeout, request.send()) => res,
        };

        let response = match response {
            Ok(result) => result.map_err(|error| map_rest_transport_error(&error, err_ctx))?,
            Err(_) => return Err(timeout_error(err_ctx)),
        };

        let status = response.status().as_u16();
        let payload = response
            .bytes()
            .await
            .map_err(|error| map_rest_transport_error(&error, err_ctx))?;

        tracing::debug!(
            operation = err_ctx.operation,
            status,
            bytes = payload.len(),
            "schema request completed"
        );

        Ok(RestReply {
            status,
            body: payload.to_vec(),
        })
    }

    /// Send a request and map non-success statuses.
    ///
    /// Returns `None` for a 404 when `allow_not_found` is set.
    async fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        err_ctx: &SchemaErrorContext,
        allow_not_found: bool,
    ) -> Result<Option<Vec<u8>>> {
        let reply = self.send(ctx, method, endpoint, body, err_ctx).await?;
        if reply.status == 404 && allow_not_found {
            return Ok(None);
        }
        if !(200..300).contains(&reply.status) {
            return Err(map_rest_error(reply.status, &reply.body, err_ctx));
        }
        Ok(Some(reply.body))
    }

    async fn fetch_class(
        &self,
        ctx: &RequestContext,
        class: &ClassName,
        operation: &'static str,
    ) -> Result<Option<ClassSnapshot>> {
        let endpoint = format!("/v1/schema/{}", class.as_str());
        let err_ctx = Self::context(operation, Some(class), &endpoint);
        let body = retry_async_with_observer(
            ctx,
            self.retry,
            operation,
            || self.request(ctx, Method::GET, &endpoint, None, &err_ctx, true),
            log_retry(operation),
        )
        .await?;

        // Older servers answer a missing class with an empty 200.
        let Some(body) = body.filter(|bytes| !bytes.iter().all(u8::is_ascii_whitespace)) else {
            return Ok(None);
        };
        let value: Value =
            serde_json::from_slice(&body).map_err(|error| invalid_response_error(&error, &err_ctx))?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(ClassSnapshot::new(value)))
    }
}

fn log_retry(operation: &'static str) -> impl FnMut(u32, &ErrorEnvelope) {
    move |attempt: u32, error: &ErrorEnvelope| {
        tracing::debug!(operation, attempt, code = %error.code, "retrying schema request");
    }
}

impl SchemaPort for WeaviateRestSchema {
    fn provider(&self) -> &SchemaProviderInfo {
        &self.provider
    }

    fn class_exists(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let snapshot = self
                .fetch_class(&ctx, &class, "weaviate.class_exists")
                .await?;
            Ok(snapshot.is_some())
        })
    }

    fn get_schema(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Schema>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let operation = "weaviate.get_schema";
            let endpoint = "/v1/schema";
            let err_ctx = Self::context(operation, None, endpoint);
            let body = retry_async_with_observer(
                &ctx,
                self.retry,
                operation,
                || self.request(&ctx, Method::GET, endpoint, None, &err_ctx, false),
                log_retry(operation),
            )
            .await?
            .unwrap_or_default();

            serde_json::from_slice(&body).map_err(|error| invalid_response_error(&error, &err_ctx))
        })
    }

    fn get_class(
        &self,
        ctx: &RequestContext,
        class: ClassName,
    ) -> BoxFuture<'_, Result<Option<ClassSnapshot>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.fetch_class(&ctx, &class, "weaviate.get_class").await })
    }

    fn create_class(
        &self,
        ctx: &RequestContext,
        definition: ClassDefinition,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let operation = "weaviate.create_class";
            let endpoint = "/v1/schema";
            let err_ctx = Self::context(operation, Some(&definition.class), endpoint);
            let payload = definition.to_payload()?;

            // Not idempotent: a retried POST after a lost response would hit `class_exists`.
            self.request(&ctx, Method::POST, endpoint, Some(&payload), &err_ctx, false)
                .await?;
            Ok(())
        })
    }

    fn delete_class(&self, ctx: &RequestContext, class: ClassName) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let operation = "weaviate.delete_class";
            let endpoint = format!("/v1/schema/{}", class.as_str());
            let err_ctx = Self::context(operation, Some(&class), &endpoint);
            retry_async_with_observer(
                &ctx,
                self.retry,
                operation,
                || self.request(&ctx, Method::DELETE, &endpoint, None, &err_ctx, true),
                log_retry(operation),
            )
            .await?;
            Ok(())
        })
    }
}
