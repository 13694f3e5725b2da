//! Domain primitives with validated constructors.

use index_config_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `ClassName` is empty after trimming.
    EmptyClassName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `ClassName` violates the allowed pattern.
    InvalidClassName {
        /// Trimmed class name that failed validation.
        input: String,
    },
    /// `PropertyName` is empty after trimming.
    EmptyPropertyName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `PropertyName` violates the allowed pattern.
    InvalidPropertyName {
        /// Trimmed property name that failed validation.
        input: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyClassName { .. } | Self::InvalidClassName { .. } => {
                ErrorCode::new("domain", "invalid_class_name")
            },
            Self::EmptyPropertyName { .. } | Self::InvalidPropertyName { .. } => {
                ErrorCode::new("domain", "invalid_property_name")
            },
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyClassName { .. } => formatter.write_str("ClassName must be non-empty"),
            Self::InvalidClassName { .. } => {
                formatter.write_str("ClassName must match /^[A-Za-z][_0-9A-Za-z]*$/")
            },
            Self::EmptyPropertyName { .. } => {
                formatter.write_str("PropertyName must be non-empty")
            },
            Self::InvalidPropertyName { .. } => {
                formatter.write_str("PropertyName must match /^[_A-Za-z][_0-9A-Za-z]*$/")
            },
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::EmptyClassName { input_length }
            | PrimitiveError::EmptyPropertyName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidClassName { input }
            | PrimitiveError::InvalidPropertyName { input } => {
                envelope.with_metadata("input", input)
            },
        }
    }
}

/// Name of a collection ("class") on the vector database.
///
/// The service stores class names with an upper-case first letter, so
/// parsing normalizes `configCollection` to `ConfigCollection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName(Box<str>);

impl ClassName {
    /// Parse and normalize a class name.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::EmptyClassName {
                input_length: raw.len(),
            });
        };

        if !matches_identifier(trimmed, false) {
            return Err(PrimitiveError::InvalidClassName {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(upper_first(trimmed).into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when `other` names the same class once normalized.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        upper_first(other.trim()) == *self.0
    }
}

impl TryFrom<String> for ClassName {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ClassName> for String {
    fn from(value: ClassName) -> Self {
        value.0.into_string()
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Name of a class property (or a named vector).
///
/// The service stores property names with a lower-case first letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyName(Box<str>);

impl PropertyName {
    /// Parse and normalize a property name.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::EmptyPropertyName {
                input_length: raw.len(),
            });
        };

        if !matches_identifier(trimmed, true) {
            return Err(PrimitiveError::InvalidPropertyName {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(lower_first(trimmed).into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when `other` names the same property once normalized.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        lower_first(other.trim()) == *self.0
    }
}

impl TryFrom<String> for PropertyName {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PropertyName> for String {
    fn from(value: PropertyName) -> Self {
        value.0.into_string()
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Upper-case the first character, leaving the rest untouched.
pub(crate) fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + chars.as_str()
    })
}

/// Lower-case the first character, leaving the rest untouched.
pub(crate) fn lower_first(input: &str) -> String {
    let mut chars = input.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_lowercase().to_string() + chars.as_str()
    })
}

fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn matches_identifier(candidate: &str, allow_leading_underscore: bool) -> bool {
    let mut chars = candidate.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || (allow_leading_underscore && first == '_')) {
        return false;
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_is_capitalized() -> Result<(), PrimitiveError> {
        let name = ClassName::parse(" configCollection ")?;
        assert_eq!(name.as_str(), "ConfigCollection");
        assert!(name.matches("configCollection"));
        assert!(name.matches("ConfigCollection"));
        assert!(!name.matches("ConfigCollections"));
        Ok(())
    }

    #[test]
    fn class_name_rejects_bad_patterns() {
        assert!(matches!(
            ClassName::parse("   "),
            Err(PrimitiveError::EmptyClassName { input_length: 3 })
        ));
        assert!(matches!(
            ClassName::parse("1Collection"),
            Err(PrimitiveError::InvalidClassName { .. })
        ));
        assert!(matches!(
            ClassName::parse("_Hidden"),
            Err(PrimitiveError::InvalidClassName { .. })
        ));
        assert!(matches!(
            ClassName::parse("with-dash"),
            Err(PrimitiveError::InvalidClassName { .. })
        ));
    }

    #[test]
    fn property_name_is_lowercased_first() -> Result<(), PrimitiveError> {
        let name = PropertyName::parse("Title")?;
        assert_eq!(name.as_str(), "title");
        assert!(name.matches("Title"));
        assert!(PropertyName::parse("_internal").is_ok());
        assert!(PropertyName::parse("bad name").is_err());
        Ok(())
    }

    #[test]
    fn class_name_deserializes_through_validation() -> Result<(), serde_json::Error> {
        let name: ClassName = serde_json::from_str("\"article\"")?;
        assert_eq!(name.as_str(), "Article");
        assert!(serde_json::from_str::<ClassName>("\"not valid\"").is_err());
        Ok(())
    }

    #[test]
    fn primitive_errors_map_to_envelopes() {
        let envelope = ErrorEnvelope::from(PrimitiveError::InvalidClassName {
            input: "bad-name".to_owned(),
        });
        assert_eq!(envelope.code, ErrorCode::new("domain", "invalid_class_name"));
        assert_eq!(
            envelope.metadata.get("input").map(String::as_str),
            Some("bad-name")
        );
    }
}
