//! The server-side materialization of a capsule.
//!
//! [`ServerValue`] is what lives in the [`crate::table::ObjectTable`]: the
//! same closed shape as [`Capsule`] except that a handle resolves to a
//! shared, possibly-mutable [`crate::object::RemoteObject`] rather than an
//! id.

use std::fmt;
use std::sync::{Arc, Mutex};

use capsule_types::{Capsule, EvaluateVariant, ProtocolError};

use crate::object::RemoteObject;
use crate::table::ObjectTable;

#[derive(Clone, Debug)]
pub enum ServerValue {
    None,
    Integer(i64),
    String(String),
    Unicode(String),
    Boolean(bool),
    List(Vec<ServerValue>),
    Tuple(Vec<ServerValue>),
    Set(Vec<ServerValue>),
    Dictionary(Vec<(String, ServerValue)>),
    Object(Arc<Mutex<dyn RemoteObject>>),
}

impl ServerValue {
    pub fn object(remote: impl RemoteObject + 'static) -> Self {
        ServerValue::Object(Arc::new(Mutex::new(remote)))
    }

    /// Materialize a wire capsule into a server value, resolving any handle
    /// through `table`.
    pub fn from_capsule(capsule: &Capsule, table: &ObjectTable) -> Result<Self, ProtocolError> {
        Ok(match capsule {
            Capsule::Handle(id) => table.access(*id)?,
            Capsule::None => ServerValue::None,
            Capsule::Integer(value) => ServerValue::Integer(*value),
            Capsule::String(value) => ServerValue::String(value.clone()),
            Capsule::Unicode(value) => ServerValue::Unicode(value.clone()),
            Capsule::Boolean(value) => ServerValue::Boolean(*value),
            Capsule::List(items) => ServerValue::List(materialize_all(items, table)?),
            Capsule::Tuple(items) => ServerValue::Tuple(materialize_all(items, table)?),
            Capsule::Set(items) => ServerValue::Set(materialize_all(items, table)?),
            Capsule::Dictionary(entries) => {
                let mut materialized = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    materialized.push((key.clone(), ServerValue::from_capsule(value, table)?));
                }
                ServerValue::Dictionary(materialized)
            }
        })
    }

    /// Store this value fresh in `table` and return a handle capsule to it
    /// Every non-evaluate command response wraps its result this way,
    /// even for primitive returns.
    pub fn into_handle_capsule(self, table: &ObjectTable) -> Capsule {
        Capsule::Handle(table.store(self))
    }

    /// Coerce the *current* value to a primitive capsule without storing it
    /// `evaluate` never mutates the object. `variant` is purely an
    /// informational hint the caller echoes back in the response; the
    /// capsule returned here always reflects the value's actual shape, and
    /// the only failure mode is a handle gone stale before this point (an
    /// access error raised by the caller, not here).
    pub fn coerce(&self, variant: EvaluateVariant) -> Result<Capsule, ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().coerce(variant),
            other => other.clone().try_into(),
        }
    }

    fn as_int(&self) -> Result<i64, ProtocolError> {
        match self {
            ServerValue::Integer(value) => Ok(*value),
            ServerValue::Boolean(value) => Ok(*value as i64),
            other => Err(ProtocolError::execution(format!("{other} cannot be coerced to int"))),
        }
    }

    fn as_text(&self) -> Result<String, ProtocolError> {
        match self {
            ServerValue::String(value) | ServerValue::Unicode(value) => Ok(value.clone()),
            ServerValue::Integer(value) => Ok(value.to_string()),
            ServerValue::Boolean(value) => Ok(value.to_string()),
            ServerValue::None => Ok("None".to_string()),
            other => Err(ProtocolError::execution(format!("{other} cannot be coerced to text"))),
        }
    }

    pub fn get_attr(&self, name: &str) -> Result<ServerValue, ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().get_attr(name),
            other => Err(ProtocolError::attribute(format!("{other} has no attribute `{name}`"))),
        }
    }

    pub fn set_attr(&self, name: &str, value: ServerValue) -> Result<(), ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().set_attr(name, value),
            other => Err(ProtocolError::attribute(format!("{other} has no attribute `{name}`"))),
        }
    }

    pub fn get_item(&self, key: &ServerValue) -> Result<ServerValue, ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().get_item(key),
            ServerValue::List(items) | ServerValue::Tuple(items) => {
                let index = key.as_int()? as usize;
                items
                    .get(index)
                    .cloned()
                    .ok_or_else(|| ProtocolError::execution(format!("index {index} out of range")))
            }
            ServerValue::Dictionary(entries) => {
                let key_text = key.as_text()?;
                entries
                    .iter()
                    .find(|(entry_key, _)| entry_key == &key_text)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| ProtocolError::execution(format!("key `{key_text}` not found")))
            }
            other => Err(ProtocolError::execution(format!("{other} does not support item access"))),
        }
    }

    pub fn set_item(&self, key: ServerValue, value: ServerValue) -> Result<(), ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().set_item(key, value),
            other => Err(ProtocolError::execution(format!("{other} does not support item assignment"))),
        }
    }

    pub fn call(&self, args: Vec<ServerValue>, kwargs: Vec<(String, ServerValue)>) -> Result<ServerValue, ProtocolError> {
        match self {
            ServerValue::Object(object) => object.lock().unwrap().call(args, kwargs),
            other => Err(ProtocolError::execution(format!("{other} is not callable"))),
        }
    }

    pub fn equals(&self, other: &ServerValue) -> Result<bool, ProtocolError> {
        match (self, other) {
            (ServerValue::Object(left), _) => left.lock().unwrap().equals(other),
            (_, ServerValue::Object(right)) => right.lock().unwrap().equals(self),
            (ServerValue::None, ServerValue::None) => Ok(true),
            (ServerValue::Integer(a), ServerValue::Integer(b)) => Ok(a == b),
            (ServerValue::Boolean(a), ServerValue::Boolean(b)) => Ok(a == b),
            (ServerValue::String(a), ServerValue::String(b)) => Ok(a == b),
            (ServerValue::Unicode(a), ServerValue::Unicode(b)) => Ok(a == b),
            (ServerValue::List(a), ServerValue::List(b)) | (ServerValue::Tuple(a), ServerValue::Tuple(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (left, right) in a.iter().zip(b.iter()) {
                    if !left.equals(right)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn add(&self, other: &ServerValue) -> Result<ServerValue, ProtocolError> {
        match (self, other) {
            (ServerValue::Object(left), _) => left.lock().unwrap().add(other),
            (ServerValue::Integer(a), ServerValue::Integer(b)) => Ok(ServerValue::Integer(a + b)),
            (ServerValue::String(a), ServerValue::String(b)) => Ok(ServerValue::String(format!("{a}{b}"))),
            (ServerValue::Unicode(a), ServerValue::Unicode(b)) => Ok(ServerValue::Unicode(format!("{a}{b}"))),
            (ServerValue::List(a), ServerValue::List(b)) => {
                Ok(ServerValue::List(a.iter().cloned().chain(b.iter().cloned()).collect()))
            }
            (ServerValue::Tuple(a), ServerValue::Tuple(b)) => {
                Ok(ServerValue::Tuple(a.iter().cloned().chain(b.iter().cloned()).collect()))
            }
            (left, right) => Err(ProtocolError::execution(format!("unsupported operand type(s) for +: {left} and {right}"))),
        }
    }
}

fn materialize_all(items: &[Capsule], table: &ObjectTable) -> Result<Vec<ServerValue>, ProtocolError> {
    items.iter().map(|item| ServerValue::from_capsule(item, table)).collect()
}

impl TryFrom<ServerValue> for Capsule {
    type Error = ProtocolError;

    /// Structural conversion back to the wire shape, used by `evaluate` to
    /// hand back a value's current shape regardless of the requested
    /// variant. An `Object` nested inside a container has no handle to be
    /// re-expressed as without the table that minted it, so it is rejected
    /// rather than silently dropped.
    fn try_from(value: ServerValue) -> Result<Self, Self::Error> {
        Ok(match value {
            ServerValue::None => Capsule::None,
            ServerValue::Integer(value) => Capsule::Integer(value),
            ServerValue::String(value) => Capsule::String(value),
            ServerValue::Unicode(value) => Capsule::Unicode(value),
            ServerValue::Boolean(value) => Capsule::Boolean(value),
            ServerValue::List(items) => Capsule::List(try_convert_all(items)?),
            ServerValue::Tuple(items) => Capsule::Tuple(try_convert_all(items)?),
            ServerValue::Set(items) => Capsule::Set(try_convert_all(items)?),
            ServerValue::Dictionary(entries) => {
                let mut converted = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    converted.push((key, Capsule::try_from(value)?));
                }
                Capsule::Dictionary(converted)
            }
            ServerValue::Object(_) => {
                return Err(ProtocolError::execution("cannot evaluate an object nested inside a container".to_string()));
            }
        })
    }
}

fn try_convert_all(items: Vec<ServerValue>) -> Result<Vec<Capsule>, ProtocolError> {
    items.into_iter().map(Capsule::try_from).collect()
}

impl fmt::Display for ServerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerValue::None => write!(f, "None"),
            ServerValue::Integer(value) => write!(f, "{value}"),
            ServerValue::String(value) | ServerValue::Unicode(value) => write!(f, "{value:?}"),
            ServerValue::Boolean(value) => write!(f, "{value}"),
            ServerValue::List(_) => write!(f, "list"),
            ServerValue::Tuple(_) => write!(f, "tuple"),
            ServerValue::Set(_) => write!(f, "set"),
            ServerValue::Dictionary(_) => write!(f, "dictionary"),
            ServerValue::Object(_) => write!(f, "object"),
        }
    }
}
