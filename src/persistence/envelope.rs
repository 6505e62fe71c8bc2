//! Versioned JSON envelope
//!
//! Every saved blob is wrapped as `{ "version": N, "payload": ... }` so a
//! future layout change can be detected before the payload is decoded.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, Result};

/// Layout version written by this build
pub const SAVE_VERSION: u32 = 1;

/// Version tag plus opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub payload: serde_json::Value,
}

impl SaveEnvelope {
    /// Wrap a value at the current version
    pub fn wrap<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            version: SAVE_VERSION,
            payload: serde_json::to_value(value)?,
        })
    }

    /// Decode the payload, refusing envelopes from other versions
    pub fn open<T: DeserializeOwned>(self) -> Result<T> {
        if self.version != SAVE_VERSION {
            return Err(CollapseError::UnsupportedVersion {
                found: self.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(serde_json::from_value(self.payload)?)
    }
}

/// Serialize `value` inside an envelope
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(&SaveEnvelope::wrap(value)?)?)
}

/// Parse an envelope and decode its payload
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    let envelope: SaveEnvelope = serde_json::from_str(json)?;
    envelope.open()
}
