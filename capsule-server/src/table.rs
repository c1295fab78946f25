//! The process-wide object table.

use std::collections::HashMap;
use std::sync::Mutex;

use capsule_types::{HandleId, ProtocolError};

use crate::value::ServerValue;

#[derive(Default, Debug)]
struct TableInner {
    objects: HashMap<HandleId, ServerValue>,
    exports: HashMap<String, ServerValue>,
}

/// Maps handle ids to owned server values, plus a name→value export map.
/// Shared across every connection handler behind a single mutex: reads
/// and writes serialize, so a `fetch` can never observe a half-finished
/// `store`.
#[derive(Default, Debug)]
pub struct ObjectTable {
    inner: Mutex<TableInner>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name` so future `fetch(name)` calls can reach it
    /// (not a wire command — a server-side setup operation).
    pub fn export(&self, name: impl Into<String>, value: ServerValue) {
        self.inner.lock().unwrap().exports.insert(name.into(), value);
    }

    /// Look up an exported name and store a fresh handle aliasing the same
    /// object: repeated fetches yield distinct ids aliasing the same
    /// underlying value.
    pub fn fetch(&self, name: &str) -> Result<HandleId, ProtocolError> {
        let mut inner = self.inner.lock().unwrap();
        let value = inner
            .exports
            .get(name)
            .cloned()
            .ok_or_else(|| ProtocolError::access(format!("no such exported name `{name}`")))?;
        let id = HandleId::new();
        inner.objects.insert(id, value);
        Ok(id)
    }

    /// Store a freshly materialized value under a new id.
    pub fn store(&self, value: ServerValue) -> HandleId {
        let id = HandleId::new();
        self.inner.lock().unwrap().objects.insert(id, value);
        id
    }

    /// Look up a value by id. An unknown id is an access error.
    pub fn access(&self, id: HandleId) -> Result<ServerValue, ProtocolError> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(&id)
            .cloned()
            .ok_or_else(|| ProtocolError::access(format!("no such handle `{id}`")))
    }

    /// Drop a table entry. An unknown id is an access error; a connection
    /// closing does NOT release its entries — only an explicit release does.
    pub fn release(&self, id: HandleId) -> Result<(), ProtocolError> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ProtocolError::access(format!("no such handle `{id}`")))
    }
}
