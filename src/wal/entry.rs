//! WAL Entry definitions
//!
//! One mutation per record, encoded as a single line of compact JSON:
//! `{"op":"SET","key":"k","value":"v"}` or `{"op":"DEL","key":"k"}`.

use serde::{Deserialize, Serialize};

use crate::error::{EmberError, Result};

/// Operations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    #[serde(rename = "SET")]
    Set,

    #[serde(rename = "DEL")]
    Delete,
}

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The operation to perform
    #[serde(rename = "op", alias = "operation")]
    pub operation: OperationType,

    pub key: String,

    /// Present only for `Set`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl LogEntry {
    /// Build a `Set` entry; key and value must be UTF-8
    pub fn set(key: &[u8], value: &[u8]) -> Result<Self> {
        Ok(Self {
            operation: OperationType::Set,
            key: utf8("key", key)?,
            value: Some(utf8("value", value)?),
        })
    }

    /// Build a `Delete` entry; key must be UTF-8
    pub fn delete(key: &[u8]) -> Result<Self> {
        Ok(Self {
            operation: OperationType::Delete,
            key: utf8("key", key)?,
            value: None,
        })
    }

    /// Serialize to one JSON line body (no trailing delimiter)
    ///
    /// Compact JSON escapes control characters, so the output never
    /// contains a raw newline.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a record produced by [`LogEntry::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }

    /// Value of a `Set`; a `Set` written without a value replays as empty
    pub fn value_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or("").as_bytes()
    }
}

fn utf8(what: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| EmberError::Serialization(format!("{} is not valid UTF-8: {}", what, e)))
}
