//! Error taxonomy for the capsule protocol.
//!
//! [`DecodeError`] is local-only: it is what the codec produces when an
//! envelope cannot even be parsed into a [`crate::capsule::Capsule`],
//! [`crate::command::Command`] or [`crate::response::Response`]. It never
//! crosses the wire.
//!
//! [`ProtocolError`] is the server-side cause taxonomy. It is carried over
//! the wire as one of the `error*` [`crate::response::Response`] variants
//! and reconstructed on the client as [`ClientError`].

use thiserror::Error;

/// Failure to decode a tagged envelope into one of the three closed
/// families (Capsule / Command / Response).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("envelope is missing the `serial` tag")]
    MissingSerial,
    #[error("unrecognized `serial` tag `{0}` for this family")]
    UnknownSerial(String),
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// The server-side cause taxonomy. Every command execution path funnels
/// its failures through one of these variants; none of them ever unwinds
/// as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    Access(String),
    #[error("{0}")]
    Attribute(String),
    #[error("{0}")]
    Operation(String),
    #[error("{0}")]
    Execution(String),
}

impl ProtocolError {
    pub fn access(message: impl Into<String>) -> Self {
        Self::Access(message.into())
    }

    pub fn attribute(message: impl Into<String>) -> Self {
        Self::Attribute(message.into())
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// The informational "fully qualified exception class name" field.
    /// Fixed per variant, never used to dynamically resolve a type;
    /// carried for display/logging only.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Access(_) => "capsule.AccessError",
            Self::Attribute(_) => "capsule.AttributeError",
            Self::Operation(_) => "capsule.OperationError",
            Self::Execution(_) => "capsule.ExecutionError",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Access(text) | Self::Attribute(text) | Self::Operation(text) | Self::Execution(text) => {
                text
            }
        }
    }
}

/// A server-side failure reconstituted on the client, plus the purely local
/// failure modes a request/response round trip can hit on its own
/// (malformed response, transport failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("access error: {text} (class: {class})")]
    Access { class: String, text: String },
    #[error("attribute error: {text} (class: {class})")]
    Attribute { class: String, text: String },
    #[error("operation error: {text} (class: {class})")]
    Operation { class: String, text: String },
    #[error("execution error: {text} (class: {class})")]
    Execution { class: String, text: String },
    #[error("error: {text} (class: {class})")]
    Generic { class: String, text: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] DecodeError),
    #[error("transport error: {0}")]
    Transport(String),
}
