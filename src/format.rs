//! Embedded record formats
//!
//! Each format owns the decoding of its wire-level payload representation
//! into raw bytes and keys one pooled producer handle. Adding a format means
//! adding a variant and its decode arm.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

use crate::error::RestGatewayError;

/// Serialization format of record payloads embedded in a produce request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedFormat {
    /// Raw bytes, carried as base64 strings on the wire
    Binary,
    /// Structured JSON values, forwarded as their serialized form
    Json,
}

impl EmbeddedFormat {
    /// Decode one payload field from its request-body representation.
    ///
    /// Absent and null fields decode to `None` (tombstones and keyless
    /// records are legal). Decode failures are client errors, reported
    /// before any send is attempted.
    pub fn decode_field(
        &self,
        field: Option<&serde_json::Value>,
    ) -> Result<Option<Bytes>, RestGatewayError> {
        let value = match field {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(value) => value,
        };

        match self {
            Self::Binary => {
                let text = value.as_str().ok_or_else(|| {
                    RestGatewayError::validation("binary payloads must be base64 strings")
                })?;
                let decoded = STANDARD.decode(text).map_err(|e| {
                    RestGatewayError::validation(format!("invalid base64 payload: {e}"))
                })?;
                Ok(Some(Bytes::from(decoded)))
            }
            Self::Json => {
                let encoded = serde_json::to_vec(value).map_err(|e| {
                    RestGatewayError::validation(format!("unencodable JSON payload: {e}"))
                })?;
                Ok(Some(Bytes::from(encoded)))
            }
        }
    }
}

impl fmt::Display for EmbeddedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for EmbeddedFormat {
    type Err = RestGatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            other => Err(RestGatewayError::validation(format!(
                "unknown embedded format '{other}'"
            ))),
        }
    }
}
