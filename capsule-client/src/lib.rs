#![deny(missing_debug_implementations)]

pub mod handle;
pub mod proxy;

pub use handle::RemoteHandle;
pub use proxy::ClientProxy;
