#![deny(missing_debug_implementations)]

//! Wire data model for the capsule remoting protocol.
//!
//! This crate is transport-agnostic: it defines how capsules,
//! commands and responses are shaped and how they encode to and decode
//! from the string-keyed JSON-compatible structured map that crosses the
//! wire. It does not open a socket and does not know how to execute a
//! command against a live object table — see `capsule-server` and
//! `capsule-client` for those.

pub mod capsule;
pub mod command;
pub mod error;
pub mod handle;
pub mod response;

pub use capsule::Capsule;
pub use command::{Command, EvaluateVariant, OperatorVariant};
pub use error::{ClientError, DecodeError, ProtocolError};
pub use handle::HandleId;
pub use response::Response;
