//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: present-but-empty or malformed values fail fast,
//! and secret values are redacted in error metadata. Provider keys are the
//! exception: a blank provider key counts as unset.

use crate::schema::{ClientConfig, ValidatedClientConfig};
use index_config_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: service URL.
pub const ENV_URL: &str = "IXC_URL";
/// Env var: service API key.
pub const ENV_API_KEY: &str = "IXC_API_KEY";
/// Env var: per-request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "IXC_TIMEOUT_MS";
/// Env var: scenario class name.
pub const ENV_CLASS_NAME: &str = "IXC_CLASS_NAME";
/// Env var: retry max attempts.
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "IXC_RETRY_MAX_ATTEMPTS";

/// Env var: Cohere key, forwarded as `X-Cohere-Api-Key`.
pub const ENV_COHERE_API_KEY: &str = "COHERE_API_KEY";
/// Env var: Hugging Face key, forwarded as `X-HuggingFace-Api-Key`.
pub const ENV_HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";
/// Env var: OpenAI key, forwarded as `X-OpenAI-Api-Key`.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Provider key env vars and the header each one is sent as.
pub const PROVIDER_KEY_HEADERS: [(&str, &str); 3] = [
    (ENV_COHERE_API_KEY, "X-Cohere-Api-Key"),
    (ENV_HUGGINGFACE_API_KEY, "X-HuggingFace-Api-Key"),
    (ENV_OPENAI_API_KEY, "X-OpenAI-Api-Key"),
];

/// Parsed env overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientEnv {
    /// Service URL override.
    pub url: Option<Box<str>>,
    /// API key override.
    pub api_key: Option<SecretString>,
    /// Timeout override.
    pub timeout_ms: Option<u64>,
    /// Scenario class name override.
    pub class_name: Option<Box<str>>,
    /// Retry attempts override.
    pub retry_max_attempts: Option<u32>,
    /// Provider headers collected from provider key vars.
    pub provider_headers: BTreeMap<Box<str>, SecretString>,
}

impl ClientEnv {
    /// Parse env overrides from a map of env vars.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        let mut provider_headers = BTreeMap::new();
        for (var, header) in PROVIDER_KEY_HEADERS {
            if let Some(value) = parse_provider_key(map, var) {
                provider_headers.insert(header.into(), value);
            }
        }

        Ok(Self {
            url: parse_optional_trimmed_string(map, ENV_URL)?,
            api_key: parse_optional_secret(map, ENV_API_KEY)?,
            timeout_ms: parse_optional_u64(map, ENV_TIMEOUT_MS)?,
            class_name: parse_optional_trimmed_string(map, ENV_CLASS_NAME)?,
            retry_max_attempts: parse_optional_u32(map, ENV_RETRY_MAX_ATTEMPTS)?,
            provider_headers,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_map(&map)
    }
}

/// Apply env overrides on top of a base config, then validate and normalize.
pub fn apply_env_overrides(
    base: ClientConfig,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let mut config = base;

    if let Some(url) = env.url.as_ref() {
        config.connection.url = url.clone();
    }
    if let Some(api_key) = env.api_key.as_ref() {
        config.connection.api_key = Some(api_key.clone());
    }
    if let Some(timeout_ms) = env.timeout_ms {
        config.connection.timeout_ms = timeout_ms;
    }
    if let Some(class_name) = env.class_name.as_ref() {
        config.scenarios.class_name = class_name.clone();
    }
    if let Some(max_attempts) = env.retry_max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    for (header, value) in &env.provider_headers {
        config
            .connection
            .additional_headers
            .insert(header.clone(), value.clone());
    }

    config.validate_and_normalize().map_err(ErrorEnvelope::from)
}

/// Typed env parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} is set but empty"),
            Self::EmptySecret { var } => write!(formatter, "{var} is set but empty (secret)"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidInt { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed.to_owned())))
}

fn parse_provider_key(map: &BTreeMap<String, String>, var: &str) -> Option<SecretString> {
    map.get(var)
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(|trimmed| SecretString::new(trimmed.to_owned()))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(value) = parse_optional_u64(map, var)? else {
        return Ok(None);
    };
    u32::try_from(value)
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: value.to_string(),
        })
}
