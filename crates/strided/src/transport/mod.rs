//! Socket transport for client sessions.
//!
//! A [`SocketListener`] binds the configured endpoint and accepts clients on
//! a background thread. Every accepted connection is handed to a
//! [`ConnectionHandler`] on its own thread, so sessions never share state.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream};
pub use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, EchoHandler};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
