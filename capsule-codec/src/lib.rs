#![deny(missing_debug_implementations)]

//! Wire framing and transport boundary for the capsule protocol.
//!
//! This crate holds exactly the pieces the protocol leaves "external
//! collaborators, referenced only by interface": the JSON text framing and
//! the abstract read/write boundary a real socket (or a test pipe) fills
//! in. Nothing here knows about [`capsule_types::Command`] execution or
//! [`capsule_types::Capsule`] materialization.

pub mod framing;
pub mod transport;

pub use framing::{decode_message, encode_message, FramingError, MAX_FRAME_BYTES};
pub use transport::{AsyncTransport, SyncTransport, TransportError};
