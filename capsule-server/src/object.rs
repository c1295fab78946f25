//! The server-side reflection boundary: a statically typed target exposes
//! a handle as an opaque object with explicit methods instead of arbitrary
//! attribute/method reflection.
//!
//! Python's source relies on `getattr`/`setattr`/`__getitem__`/`__call__`
//! reaching arbitrary objects. Rust has no such general reflection, so a
//! server-exported object must opt in to the operations it supports by
//! implementing [`RemoteObject`]; every method defaults to the matching
//! [`ProtocolError`] failure mode, mirroring what the reference server
//! would raise for an object that truly does not support the operation.

use std::fmt;

use capsule_types::{EvaluateVariant, ProtocolError};

use crate::value::ServerValue;

pub trait RemoteObject: Send + Sync + fmt::Debug {
    fn get_attr(&self, name: &str) -> Result<ServerValue, ProtocolError> {
        Err(ProtocolError::attribute(format!("no attribute `{name}`")))
    }

    fn set_attr(&mut self, name: &str, value: ServerValue) -> Result<(), ProtocolError> {
        let _ = value;
        Err(ProtocolError::attribute(format!("no attribute `{name}`")))
    }

    fn get_item(&self, key: &ServerValue) -> Result<ServerValue, ProtocolError> {
        let _ = key;
        Err(ProtocolError::execution("object does not support item access".to_string()))
    }

    fn set_item(&mut self, key: ServerValue, value: ServerValue) -> Result<(), ProtocolError> {
        let _ = (key, value);
        Err(ProtocolError::execution("object does not support item assignment".to_string()))
    }

    fn call(&mut self, args: Vec<ServerValue>, kwargs: Vec<(String, ServerValue)>) -> Result<ServerValue, ProtocolError> {
        let _ = (args, kwargs);
        Err(ProtocolError::execution("object is not callable".to_string()))
    }

    fn equals(&self, other: &ServerValue) -> Result<bool, ProtocolError> {
        let _ = other;
        Ok(false)
    }

    fn add(&self, other: &ServerValue) -> Result<ServerValue, ProtocolError> {
        let _ = other;
        Err(ProtocolError::execution("unsupported operand type(s) for +".to_string()))
    }

    fn coerce(&self, variant: EvaluateVariant) -> Result<capsule_types::Capsule, ProtocolError> {
        let _ = variant;
        Err(ProtocolError::execution("object cannot be coerced to a primitive".to_string()))
    }
}
