//! Request header construction (bearer auth + provider key headers).

use index_config_shared::{ErrorCode, ErrorEnvelope, Result, SecretString};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Inputs for the default header map.
pub struct RestAuthInput<'a> {
    /// API key sent as `Authorization: Bearer <key>`.
    pub api_key: Option<&'a SecretString>,
    /// Extra headers forwarded on every request.
    pub additional_headers: &'a BTreeMap<Box<str>, SecretString>,
}

/// Bearer header value for an API key, if one is usable.
pub fn build_bearer_header(api_key: Option<&SecretString>) -> Option<String> {
    api_key
        .map(|key| key.expose().trim())
        .filter(|key| !key.is_empty())
        .map(|key| format!("Bearer {key}"))
}

/// Build the headers sent with every request.
pub fn build_default_headers(input: &RestAuthInput<'_>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(auth) = build_bearer_header(input.api_key) {
        let mut value = HeaderValue::from_str(&auth).map_err(|_| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "API key contains characters not allowed in a header",
            )
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    for (name, secret) in input.additional_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ErrorEnvelope::expected(ErrorCode::invalid_input(), "invalid header name")
                .with_metadata("header", name.to_string())
        })?;
        let mut value = HeaderValue::from_str(secret.expose().trim()).map_err(|_| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "header value contains characters not allowed in a header",
            )
            .with_metadata("header", name.to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(header_name, value);
    }

    Ok(headers)
}
