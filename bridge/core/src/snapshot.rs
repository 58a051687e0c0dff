//! Dataref Snapshot and Catalog
//!
//! A [`Catalog`] maps numeric subscription ids to dataref names for one feed
//! connection. A [`Snapshot`] is the last known decoded value of every
//! subscribed dataref, keyed by name. Both are rebuilt from scratch on every
//! feed (re)connection.

use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors raised while decoding a single dataref
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload was not valid base64
    #[error("invalid base64 payload for {name}: {reason}")]
    InvalidBase64 {
        /// Dataref name
        name: String,
        /// Decoder message
        reason: String,
    },

    /// Payload bytes were not valid UTF-8
    #[error("payload for {name} is not valid UTF-8")]
    InvalidUtf8 {
        /// Dataref name
        name: String,
    },

    /// JSON value of a kind no decoder understands
    #[error("unsupported value for {name}: {value}")]
    UnsupportedValue {
        /// Dataref name
        name: String,
        /// The raw value
        value: String,
    },

    /// Packed coordinate prefix could not be parsed
    #[error("malformed packed prefix in {name}: {value:?}")]
    MalformedPrefix {
        /// Dataref name
        name: String,
        /// The offending text
        value: String,
    },

    /// Packed coordinates point outside the display grid
    #[error("{name} addresses row {row}, column {col} outside the grid")]
    OutOfGrid {
        /// Dataref name
        name: String,
        /// 0-based row
        row: i32,
        /// 0-based column
        col: i32,
    },
}

/// Decoded value of a dataref
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatarefValue {
    /// Text decoded from a base64 byte payload
    Text(String),
    /// Numeric value passed through unchanged
    Number(serde_json::Number),
}

impl DatarefValue {
    /// Text content, if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }

    /// Integer content, if this is an integral number
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for DatarefValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DatarefValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for DatarefValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

/// Decode a raw subscription value the way most aircraft publish it
///
/// Strings are base64 byte arrays: decoded to UTF-8 with NUL bytes mapped to
/// spaces. Numbers pass through unchanged.
///
/// # Errors
///
/// Returns a [`DecodeError`] for bad base64, non UTF-8 payloads, or JSON
/// values that are neither strings nor numbers.
pub fn decode_raw_value(name: &str, raw: &serde_json::Value) -> Result<DatarefValue, DecodeError> {
    match raw {
        serde_json::Value::String(encoded) => {
            let bytes = BASE64_STANDARD
                .decode(encoded)
                .map_err(|e| DecodeError::InvalidBase64 {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            let text = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                name: name.to_string(),
            })?;
            Ok(DatarefValue::Text(text.replace('\0', " ")))
        }
        serde_json::Value::Number(n) => Ok(DatarefValue::Number(n.clone())),
        other => Err(DecodeError::UnsupportedValue {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Last known value of every subscribed dataref
///
/// Ordered by name so decoders see datarefs in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: BTreeMap<String, DatarefValue>,
}

impl Snapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DatarefValue>) -> Option<DatarefValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DatarefValue> {
        self.values.get(name)
    }

    /// Look up a text value
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DatarefValue::as_text)
    }

    /// Iterate over all values in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatarefValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over text values in name order
    pub fn texts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter_map(|(name, value)| value.as_text().map(|text| (name, text)))
    }

    /// Number of datarefs held
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot holds no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Snapshot
where
    K: Into<String>,
    V: Into<DatarefValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Subscription id to dataref name table for one feed connection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    names: HashMap<u64, String>,
}

impl Catalog {
    /// Build a catalog from `(id, name)` pairs
    pub fn from_entries(entries: impl IntoIterator<Item = (u64, String)>) -> Self {
        Self {
            names: entries.into_iter().collect(),
        }
    }

    /// Name for a subscription id
    #[must_use]
    pub fn name(&self, id: u64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// All subscription ids, ascending
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.names.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of datarefs in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
