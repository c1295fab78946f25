//! The 128-bit handle identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DecodeError;

/// A fresh UUID v4 identifies every table entry; never reused within a
/// server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse the hex form used on the wire.
    pub fn parse_hex(text: &str) -> Result<Self, DecodeError> {
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|error| DecodeError::Malformed(format!("invalid handle id `{text}`: {error}")))
    }

    pub fn to_hex(self) -> String {
        self.0.simple().to_string()
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Uuid> for HandleId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
