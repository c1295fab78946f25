//! [`RemoteHandle`]: a transparent stand-in for a value that actually
//! lives on the server. Every method call here is a request/response round
//! trip; nothing is cached locally beyond the handle id itself.

use std::sync::{Arc, Mutex};

use capsule_codec::SyncTransport;
use capsule_types::{Capsule, ClientError, Command, EvaluateVariant, HandleId, OperatorVariant, Response};

use crate::proxy::{into_handle, request, unexpected};

pub struct RemoteHandle<T: SyncTransport> {
    transport: Arc<Mutex<T>>,
    id: HandleId,
    released: bool,
}

impl<T: SyncTransport> RemoteHandle<T> {
    pub(crate) fn new(transport: Arc<Mutex<T>>, id: HandleId) -> Self {
        Self { transport, id, released: false }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    fn request(&self, command: Command) -> Result<Response, ClientError> {
        request(&self.transport, command)
    }

    /// `getattr(obj, name)`, returning a handle to whatever came back.
    pub fn get_attr(&self, name: impl Into<String>) -> Result<RemoteHandle<T>, ClientError> {
        let response = self.request(Command::AttributeGet { id: self.id, name: Capsule::string(name.into()) })?;
        into_handle(&self.transport, response)
    }

    /// `setattr(obj, name, value)`.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<Capsule>) -> Result<(), ClientError> {
        let response = self.request(Command::AttributeSet {
            id: self.id,
            name: Capsule::string(name.into()),
            value: value.into(),
        })?;
        expect_empty(response)
    }

    /// `obj[key]`.
    pub fn get_item(&self, key: impl Into<Capsule>) -> Result<RemoteHandle<T>, ClientError> {
        let response = self.request(Command::ItemGet { id: self.id, name: key.into() })?;
        into_handle(&self.transport, response)
    }

    /// `obj[key] = value`.
    pub fn set_item(&self, key: impl Into<Capsule>, value: impl Into<Capsule>) -> Result<(), ClientError> {
        let response = self.request(Command::ItemSet { id: self.id, name: key.into(), value: value.into() })?;
        expect_empty(response)
    }

    /// `obj(*args, **kwargs)`.
    pub fn call(
        &self,
        args: impl IntoIterator<Item = Capsule>,
        kwargs: impl IntoIterator<Item = (String, Capsule)>,
    ) -> Result<RemoteHandle<T>, ClientError> {
        let response = self.request(Command::Execute {
            id: self.id,
            args: Capsule::tuple(args),
            kwargs: Capsule::dictionary(kwargs),
        })?;
        into_handle(&self.transport, response)
    }

    /// `obj == other`, where `other` is itself wire-addressable (a local
    /// primitive or another handle).
    pub fn equals(&self, other: impl Into<Capsule>) -> Result<bool, ClientError> {
        let response = self.request(Command::Operator {
            id: self.id,
            other: other.into(),
            variant: OperatorVariant::Equals.as_str().to_string(),
        })?;
        into_handle(&self.transport, response)?.as_bool()
    }

    /// `obj + other`.
    pub fn add(&self, other: impl Into<Capsule>) -> Result<RemoteHandle<T>, ClientError> {
        let response = self.request(Command::Operator {
            id: self.id,
            other: other.into(),
            variant: OperatorVariant::Addition.as_str().to_string(),
        })?;
        into_handle(&self.transport, response)
    }

    /// `int(obj)`.
    pub fn as_int(&self) -> Result<i64, ClientError> {
        self.evaluate(EvaluateVariant::Int, |data| match data {
            Capsule::Integer(value) => Some(value),
            Capsule::Boolean(value) => Some(value as i64),
            _ => None,
        })
    }

    /// `bool(obj)`.
    pub fn as_bool(&self) -> Result<bool, ClientError> {
        self.evaluate(EvaluateVariant::Bool, |data| match data {
            Capsule::Boolean(value) => Some(value),
            _ => None,
        })
    }

    /// `str(obj)`.
    pub fn as_string(&self) -> Result<String, ClientError> {
        self.evaluate(EvaluateVariant::Str, |data| match data {
            Capsule::String(value) | Capsule::Unicode(value) => Some(value),
            _ => None,
        })
    }

    /// `list(obj)`.
    pub fn as_list(&self) -> Result<Vec<Capsule>, ClientError> {
        self.evaluate(EvaluateVariant::List, |data| match data {
            Capsule::List(items) | Capsule::Tuple(items) | Capsule::Set(items) => Some(items),
            _ => None,
        })
    }

    /// `dict(obj)`. There is no dedicated `EvaluateVariant` for
    /// dictionaries — `variant` is only an informational hint the server
    /// echoes back, never a shape constraint — so this reuses `List` as
    /// the hint and reads the actual dictionary shape back out.
    pub fn as_dict(&self) -> Result<Vec<(String, Capsule)>, ClientError> {
        self.evaluate(EvaluateVariant::List, |data| match data {
            Capsule::Dictionary(entries) => Some(entries),
            _ => None,
        })
    }

    fn evaluate<U>(&self, variant: EvaluateVariant, extract: impl FnOnce(Capsule) -> Option<U>) -> Result<U, ClientError> {
        let response = self.request(Command::Evaluate { id: self.id, variant })?;
        match response {
            Response::Evaluation { data, .. } => {
                extract(data).ok_or_else(|| ClientError::Transport("server returned a value of the wrong shape".to_string()))
            }
            other => Err(unexpected(other)),
        }
    }

    /// `__del__`: explicitly release the handle, consuming it so it cannot
    /// be used afterwards. Not required — letting the handle drop releases
    /// it too, best-effort — but lets a caller observe the release failing.
    pub fn release(mut self) -> Result<(), ClientError> {
        let response = self.request(Command::Release { id: self.id })?;
        self.released = true;
        expect_empty(response)
    }
}

fn expect_empty(response: Response) -> Result<(), ClientError> {
    match response {
        Response::Empty => Ok(()),
        other => Err(unexpected(other)),
    }
}

impl<T: SyncTransport> Drop for RemoteHandle<T> {
    /// Best-effort: a release that fails here (peer gone, table already
    /// cleared) has nowhere to report to, so it is logged and swallowed
    /// rather than panicking out of a destructor.
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = request(&self.transport, Command::Release { id: self.id }) {
            log::debug!("releasing handle {} on drop failed: {error}", self.id);
        }
    }
}

impl<T: SyncTransport> std::fmt::Debug for RemoteHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<T: SyncTransport> PartialEq for RemoteHandle<T> {
    /// Two handles compare equal if the server-side equality operator
    /// reports their referents equal. A transport failure during the
    /// round trip is treated as inequality rather than panicking, since
    /// `PartialEq` has no way to surface an error to the caller.
    fn eq(&self, other: &Self) -> bool {
        self.equals(Capsule::Handle(other.id)).unwrap_or(false)
    }
}
