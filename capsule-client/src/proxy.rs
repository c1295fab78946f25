//! The client side of a connection: wraps a transport and turns `fetch`
//! and `store` into remote handles.

use std::sync::{Arc, Mutex};

use capsule_codec::SyncTransport;
use capsule_types::{Capsule, ClientError, Command, DecodeError, HandleId, Response};

use crate::handle::RemoteHandle;

/// Shared between a [`ClientProxy`] and every [`RemoteHandle`] it hands
/// out, so a handle obtained from `fetch` can keep issuing requests over
/// the same connection long after the call that produced it returned.
pub(crate) fn request<T: SyncTransport>(transport: &Mutex<T>, command: Command) -> Result<Response, ClientError> {
    let mut transport = transport.lock().unwrap();
    transport
        .send_message(&command.to_value())
        .map_err(|error| ClientError::Transport(error.to_string()))?;
    let value = transport
        .recv_message()
        .map_err(|error| ClientError::Transport(error.to_string()))?
        .ok_or_else(|| ClientError::Transport("connection closed by peer".to_string()))?;
    Response::from_value(&value).map_err(ClientError::from)
}

/// Turn a successful response into a fresh handle aliasing whatever the
/// server stored, or into the typed error it represents.
pub(crate) fn into_handle<T: SyncTransport>(
    transport: &Arc<Mutex<T>>,
    response: Response,
) -> Result<RemoteHandle<T>, ClientError> {
    match response {
        Response::Handle { id } => Ok(RemoteHandle::new(Arc::clone(transport), id)),
        other => Err(unexpected(other)),
    }
}

pub(crate) fn unexpected(response: Response) -> ClientError {
    response
        .as_client_error()
        .unwrap_or_else(|| ClientError::from(DecodeError::Malformed(format!("unexpected response `{}`", response.serial()))))
}

/// A connection to a capsule server. Cheap to clone: every clone shares
/// the same underlying transport, serialized behind a mutex, matching the
/// reference client's "one outstanding request at a time" discipline.
pub struct ClientProxy<T: SyncTransport> {
    transport: Arc<Mutex<T>>,
}

impl<T: SyncTransport> Clone for ClientProxy<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport) }
    }
}

impl<T: SyncTransport> ClientProxy<T> {
    pub fn new(transport: T) -> Self {
        Self { transport: Arc::new(Mutex::new(transport)) }
    }

    /// Look up a name the server exported and return a fresh handle
    /// aliasing it.
    pub fn fetch(&self, name: impl Into<String>) -> Result<RemoteHandle<T>, ClientError> {
        let response = request(&self.transport, Command::Fetch { name: name.into() })?;
        into_handle(&self.transport, response)
    }

    /// Send a local value to the server and get back a handle to its
    /// server-side copy.
    pub fn store(&self, value: impl Into<Capsule>) -> Result<RemoteHandle<T>, ClientError> {
        let response = request(&self.transport, Command::Store { data: value.into() })?;
        into_handle(&self.transport, response)
    }

    /// Wrap an id already known to be valid (or not — that's discovered on
    /// first use) as a handle on this connection, without a round trip.
    pub fn handle(&self, id: HandleId) -> RemoteHandle<T> {
        RemoteHandle::new(Arc::clone(&self.transport), id)
    }
}

impl<T: SyncTransport> std::fmt::Debug for ClientProxy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientProxy").finish_non_exhaustive()
    }
}
