// crates/regcheck-core/src/document.rs
// ============================================================================
// Module: Raw Configuration Document
// Description: Parsed key/value document plus strict typed decode helpers.
// Purpose: Reject malformed values once, centrally, with key-attributed errors.
// Dependencies: serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! The configuration document is parsed once into a flat map of top-level keys
//! to JSON values. Field groups then pull their declared keys through
//! [`RawConfig::decode`], which either yields a well-typed value, yields
//! `None` for an absent key, or fails with [`ConfigError::Construction`]. A
//! construction error aborts the whole run; it is never downgraded to a
//! finding.
//!
//! Explicit `null` values are treated as absent so that YAML documents with
//! empty keys behave like documents that omit them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or constructing a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading the bundle.
    #[error("config io error: {0}")]
    Io(String),
    /// The document itself could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A present value failed its declared type.
    #[error("config key {key} is malformed: {message}")]
    Construction {
        /// Dotted key of the malformed value.
        key: String,
        /// Decoder message.
        message: String,
    },
    /// The bundle violates a loading limit.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Builds a construction error for the given key.
    #[must_use]
    pub fn construction(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            key: key.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Raw Document
// ============================================================================

/// Flat top-level view of a configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    /// Top-level key/value entries.
    entries: BTreeMap<String, Value>,
}

impl RawConfig {
    /// Parses a YAML (or JSON) document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a mapping document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value =
            serde_yaml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_value(value)
    }

    /// Builds a document from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ConfigError::Parse("config document must be a mapping".to_string())),
        }
    }

    /// Builds a document from a JSON object map.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }

    /// Returns the raw value for a key, treating `null` as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).filter(|value| !value.is_null())
    }

    /// Returns true when the key is present with a non-null value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all top-level keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Decodes a present key into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when the value does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key).map(|value| decode_value(key, value)).transpose()
    }

    /// Decodes a key, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when the value does not match `T`.
    pub fn decode_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.decode(key)?.unwrap_or(default))
    }

    /// Decodes a key, falling back to `T::default()` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when the value does not match `T`.
    pub fn decode_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, ConfigError> {
        Ok(self.decode(key)?.unwrap_or_default())
    }
}

/// Decodes a nested value, attributing failures to `key`.
///
/// # Errors
///
/// Returns [`ConfigError::Construction`] when the value does not match `T`.
pub fn decode_value<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ConfigError> {
    T::deserialize(value).map_err(|err| ConfigError::construction(key, err.to_string()))
}

// ============================================================================
// SECTION: Lenient Scalars
// ============================================================================

/// Integer that operators commonly write as a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntLike {
    /// Native integer.
    Int(i64),
    /// Float without a fractional part.
    Float(f64),
    /// Numeric string; empty means unset.
    Text(String),
}

/// Deserializes an optional integer from an int, integral float, or numeric string.
///
/// # Errors
///
/// Returns a deserialization error for non-numeric strings, fractional floats,
/// and any other type.
pub fn flexible_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IntLike>::deserialize(deserializer)
        .map_err(|_| serde::de::Error::custom("expected an integer"))?;
    match raw {
        None => Ok(None),
        Some(IntLike::Int(value)) => Ok(Some(value)),
        Some(IntLike::Float(value)) => {
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(serde::de::Error::custom("expected an integer"));
            }
            #[allow(clippy::cast_possible_truncation, reason = "integral value checked above")]
            let truncated = value as i64;
            Ok(Some(truncated))
        }
        Some(IntLike::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom("expected an integer"))
        }
    }
}
