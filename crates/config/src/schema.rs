//! Client configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Secrets (`apiKey`, header values) serialize redacted.

use index_config_domain::ClassName;
use index_config_shared::{ErrorCode, ErrorEnvelope, RetryPolicy, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Sanitizes a URL for error messages by stripping credentials.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default service URL.
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Default class used by the scenario catalog.
pub const DEFAULT_CLASS_NAME: &str = "ConfigCollection";

const CONNECTION_TIMEOUT_MIN_MS: u64 = 1_000;
const CONNECTION_TIMEOUT_MAX_MS: u64 = 600_000;

const RETRY_MAX_ATTEMPTS_MIN: u32 = 1;
const RETRY_MAX_ATTEMPTS_MAX: u32 = 10;
const RETRY_BASE_DELAY_MIN_MS: u64 = 1;
const RETRY_BASE_DELAY_MAX_MS: u64 = 60_000;
const RETRY_MAX_DELAY_MIN_MS: u64 = 1;
const RETRY_MAX_DELAY_MAX_MS: u64 = 600_000;
const RETRY_JITTER_RATIO_PCT_MIN: u32 = 0;
const RETRY_JITTER_RATIO_PCT_MAX: u32 = 100;

const ADDITIONAL_HEADERS_MAX: usize = 32;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// How to reach the vector database.
    pub connection: ConnectionConfig,
    /// Retry policy for idempotent schema calls.
    pub retry: RetryConfig,
    /// Scenario catalog settings.
    pub scenarios: ScenariosConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            connection: ConnectionConfig::default(),
            retry: RetryConfig::default(),
            scenarios: ScenariosConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedClientConfig, ConfigSchemaError> {
        self.validate_version()?;

        self.connection.normalize();
        self.connection.validate()?;
        self.retry.validate()?;
        let class_name = self.scenarios.validate()?;
        self.scenarios.class_name = class_name.as_str().into();

        Ok(ValidatedClientConfig {
            raw: self,
            class_name,
        })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Validated config wrapper carrying parsed values.
#[derive(Debug, Clone)]
pub struct ValidatedClientConfig {
    raw: ClientConfig,
    class_name: ClassName,
}

impl ValidatedClientConfig {
    /// Scenario class name, normalized.
    #[must_use]
    pub const fn class_name(&self) -> &ClassName {
        &self.class_name
    }

    /// Retry policy derived from the `retry` section.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.raw.retry.to_policy()
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &ClientConfig {
        &self.raw
    }

    /// Consume into the raw config.
    #[must_use]
    pub fn into_inner(self) -> ClientConfig {
        self.raw
    }
}

impl AsRef<ClientConfig> for ValidatedClientConfig {
    fn as_ref(&self) -> &ClientConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedClientConfig {
    type Target = ClientConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse a client config from a JSON string, applying validation and normalization.
pub fn parse_client_config_json(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a client config from a TOML string, applying validation and normalization.
pub fn parse_client_config_toml(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Connection settings for the vector database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConnectionConfig {
    /// Base URL of the service (scheme optional; `/v1` suffix allowed).
    pub url: Box<str>,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// API key sent as a bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
    /// Extra headers sent on every request (e.g. `X-Cohere-Api-Key`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_headers: BTreeMap<Box<str>, SecretString>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            timeout_ms: 30_000,
            api_key: None,
            additional_headers: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    fn normalize(&mut self) {
        self.url = self.url.trim().into();
        if self.api_key.as_ref().is_some_and(SecretString::is_blank) {
            self.api_key = None;
        }
        self.additional_headers = std::mem::take(&mut self.additional_headers)
            .into_iter()
            .map(|(name, value)| (name.trim().into(), value))
            .collect();
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_timeout_ms(
            "connection",
            "timeoutMs",
            self.timeout_ms,
            CONNECTION_TIMEOUT_MIN_MS,
            CONNECTION_TIMEOUT_MAX_MS,
        )?;
        validate_url("connection", "url", &self.url)?;
        if self.additional_headers.len() > ADDITIONAL_HEADERS_MAX {
            return Err(ConfigSchemaError::LimitOutOfRange {
                section: "connection",
                field: "additionalHeaders",
                value: u64::try_from(self.additional_headers.len()).unwrap_or(u64::MAX),
                min: 0,
                max: ADDITIONAL_HEADERS_MAX as u64,
            });
        }
        for name in self.additional_headers.keys() {
            if !is_header_name(name) {
                return Err(ConfigSchemaError::InvalidHeaderName {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Maximum attempts (including the first attempt).
    pub max_attempts: u32,
    /// Base delay for exponential backoff (ms).
    pub base_delay_ms: u64,
    /// Maximum delay cap for backoff (ms).
    pub max_delay_ms: u64,
    /// Jitter ratio as a percentage (0..=100).
    pub jitter_ratio_pct: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            jitter_ratio_pct: policy.jitter_ratio_pct,
        }
    }
}

impl RetryConfig {
    /// Convert into the runtime policy.
    #[must_use]
    pub const fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            jitter_ratio_pct: self.jitter_ratio_pct,
        }
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_limit_u32(
            "retry",
            "maxAttempts",
            self.max_attempts,
            RETRY_MAX_ATTEMPTS_MIN,
            RETRY_MAX_ATTEMPTS_MAX,
        )?;
        validate_timeout_ms(
            "retry",
            "baseDelayMs",
            self.base_delay_ms,
            RETRY_BASE_DELAY_MIN_MS,
            RETRY_BASE_DELAY_MAX_MS,
        )?;
        validate_timeout_ms(
            "retry",
            "maxDelayMs",
            self.max_delay_ms,
            RETRY_MAX_DELAY_MIN_MS,
            RETRY_MAX_DELAY_MAX_MS,
        )?;
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigSchemaError::LimitOutOfRange {
                section: "retry",
                field: "maxDelayMs",
                value: self.max_delay_ms,
                min: self.base_delay_ms,
                max: RETRY_MAX_DELAY_MAX_MS,
            });
        }
        validate_limit_u32(
            "retry",
            "jitterRatioPct",
            self.jitter_ratio_pct,
            RETRY_JITTER_RATIO_PCT_MIN,
            RETRY_JITTER_RATIO_PCT_MAX,
        )?;
        Ok(())
    }
}

/// Scenario catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ScenariosConfig {
    /// Class every scenario recreates.
    pub class_name: Box<str>,
    /// Keep running after a failed scenario.
    pub keep_going: bool,
}

impl Default for ScenariosConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.into(),
            keep_going: false,
        }
    }
}

impl ScenariosConfig {
    fn validate(&self) -> Result<ClassName, ConfigSchemaError> {
        ClassName::parse(&self.class_name).map_err(|error| ConfigSchemaError::InvalidClassName {
            section: "scenarios",
            field: "className",
            value: self.class_name.to_string(),
            reason: error.to_string(),
        })
    }
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `connection`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `retry`).
        section: &'static str,
        /// Field name in the config file (e.g. `maxAttempts`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
    /// A header name contains characters HTTP does not allow.
    InvalidHeaderName {
        /// Header name.
        name: String,
    },
    /// The scenario class name is invalid.
    InvalidClassName {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Value provided.
        value: String,
        /// Human readable reason.
        reason: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::InvalidHeaderName { .. } => ErrorCode::new("config", "invalid_header"),
            Self::InvalidClassName { .. } => ErrorCode::new("config", "invalid_class_name"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidUrl { section, field, .. } => {
                write!(formatter, "invalid URL for {section}.{field}")
            },
            Self::InvalidHeaderName { name } => {
                write!(formatter, "invalid header name in connection.additionalHeaders: {name}")
            },
            Self::InvalidClassName {
                section,
                field,
                reason,
                ..
            } => write!(formatter, "invalid class name for {section}.{field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", sanitize_url_for_error(&url)),
            ConfigSchemaError::InvalidHeaderName { name } => envelope
                .with_metadata("section", "connection")
                .with_metadata("field", "additionalHeaders")
                .with_metadata("header", name),
            ConfigSchemaError::InvalidClassName {
                section,
                field,
                value,
                reason,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value)
                .with_metadata("reason", reason),
        }
    }
}

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

const fn validate_limit_u32(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::LimitOutOfRange {
            section,
            field,
            value: value as u64,
            min: min as u64,
            max: max as u64,
        });
    }
    Ok(())
}

fn validate_url(
    section: &'static str,
    field: &'static str,
    raw: &str,
) -> Result<(), ConfigSchemaError> {
    let invalid = || ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: raw.to_string(),
    };
    if raw.is_empty() {
        return Err(invalid());
    }
    // A bare host such as `localhost:8080` is accepted; the adapter adds `http://`.
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let parsed = Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}

fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let config = ClientConfig::default().validate_and_normalize()?;
        assert_eq!(config.connection.url.as_ref(), DEFAULT_URL);
        assert_eq!(config.class_name().as_str(), DEFAULT_CLASS_NAME);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        Ok(())
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let mut config = ClientConfig::default();
        config.connection.timeout_ms = 10;
        let error = config.validate_and_normalize().err();
        assert!(matches!(
            error,
            Some(ConfigSchemaError::TimeoutOutOfRange {
                section: "connection",
                field: "timeoutMs",
                ..
            })
        ));
    }

    #[test]
    fn bare_host_urls_are_accepted() -> Result<(), ConfigSchemaError> {
        let mut config = ClientConfig::default();
        config.connection.url = " weaviate.internal:8080/v1 ".into();
        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.connection.url.as_ref(), "weaviate.internal:8080/v1");

        let mut config = ClientConfig::default();
        config.connection.url = "ftp://example.com".into();
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::InvalidUrl { .. })
        ));
        Ok(())
    }

    #[test]
    fn url_credentials_are_stripped_from_metadata() {
        let envelope = ErrorEnvelope::from(ConfigSchemaError::InvalidUrl {
            section: "connection",
            field: "url",
            url: "https://user:pw@example.com/".to_string(), // pragma: allowlist secret
        });
        assert_eq!(
            envelope.metadata.get("url").map(String::as_str),
            Some("https://example.com/")
        );
    }

    #[test]
    fn header_names_are_checked() {
        let mut config = ClientConfig::default();
        config
            .connection
            .additional_headers
            .insert("X Bad Header".into(), SecretString::new("value"));
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::InvalidHeaderName { .. })
        ));
    }

    #[test]
    fn class_name_is_normalized() -> Result<(), ConfigSchemaError> {
        let mut config = ClientConfig::default();
        config.scenarios.class_name = "myCollection".into();
        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.scenarios.class_name.as_ref(), "MyCollection");

        let mut config = ClientConfig::default();
        config.scenarios.class_name = "not valid".into();
        let envelope = config
            .validate_and_normalize()
            .err()
            .map(ErrorEnvelope::from);
        assert_eq!(
            envelope.map(|error| error.code),
            Some(ErrorCode::new("config", "invalid_class_name"))
        );
        Ok(())
    }
}
