//! Command dispatch for the remote-control protocol.
//!
//! A [`Dispatcher`] maps each command id to a [`CommandHandler`] through a
//! [`HandlerRegistry`] that is frozen after startup. Handlers return a
//! [`HandlerOutcome`] or a [`HandlerError`]; the dispatcher renders either
//! into exactly one [`stride_protocol::Response`], including when a handler
//! panics.
//!
//! ## Wire framing
//!
//! Clients send one JSON command per line:
//!
//! ```json
//! {"command_id":174,"variable_id":64,"element_id":"1"}
//! ```
//!
//! and receive one message per line:
//!
//! ```json
//! {"kind":"response","status":"ok","description":"","command_id":174,"variable_id":64,"element_id":"1","data":{"kind":"value","value":{"type":"double","value":1.34}}}
//! ```

mod codec;
mod connection;
mod context;
mod dispatcher;
mod errors;
mod outcome;
mod registry;

pub use self::codec::{DaemonMessage, LineReader, ResponseWriter, decode_command};
pub use self::connection::SessionConnectionHandler;
pub use self::context::HandlerContext;
pub use self::dispatcher::{Dispatcher, INTERNAL_ERROR_MESSAGE};
pub use self::errors::{DispatchError, HandlerError};
pub use self::outcome::{HandlerOutcome, RenderError};
pub use self::registry::{CommandHandler, HandlerRegistry, RegistryBuilder};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

#[cfg(test)]
mod tests;
