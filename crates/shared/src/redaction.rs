//! Secret detection and redaction utilities.
//!
//! Provider API keys travel as HTTP headers and config values; these helpers
//! keep them out of logs, error metadata, and rendered config.

use serde::{Deserialize, Serialize, Serializer};

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key, header, or variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use index_config_shared::is_secret_key;
///
/// assert!(is_secret_key("X-Cohere-Api-Key"));
/// assert!(is_secret_key("authorization"));
/// assert!(!is_secret_key("IXC_URL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use index_config_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("IXC_API_KEY", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("IXC_TIMEOUT_MS", "5000"), "5000");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display, Debug, and Serialize.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_provider_header_names() {
        assert!(is_secret_key("X-Cohere-Api-Key"));
        assert!(is_secret_key("X-HuggingFace-Api-Key"));
        assert!(is_secret_key("Authorization"));
        assert!(is_secret_key("IXC_API_KEY"));
    }

    #[test]
    fn rejects_non_secret_patterns() {
        assert!(!is_secret_key("IXC_URL"));
        assert!(!is_secret_key("IXC_TIMEOUT_MS"));
        assert!(!is_secret_key("className"));
    }

    #[test]
    fn secret_string_redacts_display_and_serialize() -> Result<(), serde_json::Error> {
        let secret = SecretString::new("shh");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "shh");
        assert_eq!(serde_json::to_string(&secret)?, "\"[REDACTED]\"");
        Ok(())
    }

    #[test]
    fn secret_string_deserializes_plain_value() -> Result<(), serde_json::Error> {
        let secret: SecretString = serde_json::from_str("\"abc\"")?;
        assert_eq!(secret.expose(), "abc");
        assert!(!secret.is_blank());
        Ok(())
    }
}
