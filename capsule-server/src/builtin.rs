//! A small demo [`RemoteObject`] used by the reference binary and the
//! end-to-end tests: a counter with a plain `value` attribute and a
//! `method(arg)` mutator that adds `arg` to the counter and returns the
//! new total.

use std::sync::{Arc, Mutex};

use capsule_types::ProtocolError;

use crate::object::RemoteObject;
use crate::value::ServerValue;

#[derive(Debug, Clone)]
pub struct Counter {
    value: Arc<Mutex<i64>>,
}

impl Counter {
    pub fn new(value: i64) -> Self {
        Self { value: Arc::new(Mutex::new(value)) }
    }
}

impl RemoteObject for Counter {
    fn get_attr(&self, name: &str) -> Result<ServerValue, ProtocolError> {
        match name {
            "value" => Ok(ServerValue::Integer(*self.value.lock().unwrap())),
            "method" => Ok(ServerValue::object(BoundMethod { value: Arc::clone(&self.value) })),
            other => Err(ProtocolError::attribute(format!("Counter has no attribute `{other}`"))),
        }
    }

    fn set_attr(&mut self, name: &str, value: ServerValue) -> Result<(), ProtocolError> {
        match name {
            "value" => {
                let value = match value {
                    ServerValue::Integer(value) => value,
                    other => return Err(ProtocolError::attribute(format!("`value` must be an integer, got {other}"))),
                };
                *self.value.lock().unwrap() = value;
                Ok(())
            }
            other => Err(ProtocolError::attribute(format!("Counter has no attribute `{other}`"))),
        }
    }

    fn equals(&self, other: &ServerValue) -> Result<bool, ProtocolError> {
        Ok(matches!(other, ServerValue::Integer(value) if *value == *self.value.lock().unwrap()))
    }
}

/// `counter.method(arg)` comes back from `get_attr` as a fresh handle to
/// one of these: calling it adds `arg` to the same shared counter cell it
/// was bound to and returns the new total. Mirrors the reference
/// implementation's bound-method objects, which the client calls through
/// the same `execute` command it would use for any other callable handle.
#[derive(Debug)]
struct BoundMethod {
    value: Arc<Mutex<i64>>,
}

impl RemoteObject for BoundMethod {
    fn call(&mut self, args: Vec<ServerValue>, kwargs: Vec<(String, ServerValue)>) -> Result<ServerValue, ProtocolError> {
        if !kwargs.is_empty() {
            return Err(ProtocolError::execution("Counter methods take no keyword arguments".to_string()));
        }
        let [addend] = <[ServerValue; 1]>::try_from(args)
            .map_err(|_| ProtocolError::execution("method(arg) takes exactly one argument".to_string()))?;
        let addend = match addend {
            ServerValue::Integer(value) => value,
            other => return Err(ProtocolError::execution(format!("method(arg) expects an integer, got {other}"))),
        };
        let mut guard = self.value.lock().unwrap();
        *guard += addend;
        Ok(ServerValue::Integer(*guard))
    }
}
