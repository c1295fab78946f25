//! The transport boundary.
//!
//! Neither [`SyncTransport`] nor [`AsyncTransport`] know about TCP. Each is
//! a blanket implementation over any type that already knows how to read
//! and write bytes (`std::io::{Read, Write}` for the synchronous client
//! side, `tokio::io::{AsyncRead, AsyncWrite}` for the server side), so the
//! protocol engine in `capsule-server`/`capsule-client` can be driven by a
//! real socket or by an in-memory pipe in tests without caring which.

use std::io::{Read, Write};

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::framing::{decode_message, encode_message, FramingError, MAX_FRAME_BYTES};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Blocking message transport, used by the client proxy: one outstanding
/// request at a time on a given proxy.
pub trait SyncTransport {
    fn send_message(&mut self, value: &Value) -> Result<(), TransportError>;

    /// `Ok(None)` means the peer closed the connection cleanly.
    fn recv_message(&mut self) -> Result<Option<Value>, TransportError>;
}

impl<T: Read + Write> SyncTransport for T {
    fn send_message(&mut self, value: &Value) -> Result<(), TransportError> {
        let bytes = encode_message(value)?;
        self.write_all(&bytes).map_err(|error| TransportError::Io(error.to_string()))
    }

    fn recv_message(&mut self) -> Result<Option<Value>, TransportError> {
        let mut buffer = vec![0u8; MAX_FRAME_BYTES];
        let read = self.read(&mut buffer).map_err(|error| TransportError::Io(error.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(decode_message(&buffer[..read])?))
    }
}

/// Async message transport, used by the per-connection server handler:
/// one Tokio task per connection.
pub trait AsyncTransport: Send {
    async fn send_message(&mut self, value: &Value) -> Result<(), TransportError>;

    async fn recv_message(&mut self) -> Result<Option<Value>, TransportError>;
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncTransport for T {
    async fn send_message(&mut self, value: &Value) -> Result<(), TransportError> {
        let bytes = encode_message(value)?;
        self.write_all(&bytes).await.map_err(|error| TransportError::Io(error.to_string()))
    }

    async fn recv_message(&mut self) -> Result<Option<Value>, TransportError> {
        let mut buffer = vec![0u8; MAX_FRAME_BYTES];
        let read = self.read(&mut buffer).await.map_err(|error| TransportError::Io(error.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(decode_message(&buffer[..read])?))
    }
}
