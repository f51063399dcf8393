//! Error types for command framing and handler failures.
//!
//! [`DispatchError`] covers the transport framing around commands and is
//! reported to clients as an `error` message without closing the session.
//! [`HandlerError`] is raised by command handlers and always becomes an `Err`
//! response to the command that caused it.

use std::io;

use stride_protocol::{UnsupportedVersion, ValueKind};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::world::WorldError;

/// Errors surfaced while reading commands and writing responses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Command line could not be parsed.
    #[error("malformed JSONL: {message}")]
    MalformedJsonl {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Command line exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJsonl {
            message: message.into(),
            source: None,
        }
    }

    pub fn from_json_error(error: serde_json::Error) -> Self {
        Self::MalformedJsonl {
            message: error.to_string(),
            source: Some(error),
        }
    }

    /// Whether the connection can keep serving commands after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedJsonl { .. } | Self::RequestTooLarge { .. }
        )
    }
}

/// Failures raised by command handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The addressed element does not exist.
    #[error("No element found with given object id")]
    NoElement { element_id: String },

    #[error("missing element id")]
    MissingElementId,

    #[error("missing variable id")]
    MissingVariable,

    #[error("missing payload for {operation}")]
    MissingPayload { operation: &'static str },

    #[error("expected {expected} payload, found {found}")]
    PayloadKind {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("unexpected payload for {operation}")]
    UnexpectedPayload { operation: &'static str },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// The command is not allowed in the session's current phase.
    #[error("{message}")]
    Protocol { message: String },

    /// Every variable of a new subscription failed to evaluate.
    #[error("{message}")]
    SubscriptionRejected { message: String },

    #[error(transparent)]
    Version(#[from] UnsupportedVersion),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    World(#[from] WorldError),
}

impl HandlerError {
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}
