//! Wire framing.
//!
//! The reference transport reads up to [`MAX_FRAME_BYTES`] per frame and
//! treats the whole read as a single self-describing JSON document — no
//! length prefix, no newline delimiter, matching the reference
//! implementation's `socket.recv(65535)` / `json.loads(...)` pair exactly.
//! Implementations MAY use a different framing strategy as long as whole
//! messages are delivered; this module only fixes the one the
//! reference binaries in this workspace use.

use serde_json::Value;
use thiserror::Error;

/// The reference transport's per-frame ceiling.
pub const MAX_FRAME_BYTES: usize = 65_536;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("encoded message exceeds the {MAX_FRAME_BYTES}-byte frame limit")]
    TooLarge,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Encode a structured message to bytes, enforcing the frame ceiling.
pub fn encode_message(value: &Value) -> Result<Vec<u8>, FramingError> {
    let bytes = serde_json::to_vec(value).map_err(|error| FramingError::InvalidJson(error.to_string()))?;
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(FramingError::TooLarge);
    }
    Ok(bytes)
}

/// Decode one frame's worth of bytes into a structured message.
pub fn decode_message(bytes: &[u8]) -> Result<Value, FramingError> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(FramingError::TooLarge);
    }
    serde_json::from_slice(bytes).map_err(|error| FramingError::InvalidJson(error.to_string()))
}
