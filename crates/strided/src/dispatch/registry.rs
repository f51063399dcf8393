//! Command id to handler lookup.
//!
//! The registry is assembled once at startup and is read-only afterwards, so
//! it can be shared by every connection without locking.

use std::collections::HashMap;
use std::sync::Arc;

use stride_protocol::{Command, TraciCommand};
use tracing::warn;

use super::DISPATCH_TARGET;
use super::context::HandlerContext;
use super::errors::HandlerError;
use super::outcome::HandlerOutcome;

/// Resolves one family of commands.
pub trait CommandHandler: Send + Sync {
    /// Handles `command`. Panics are caught by the dispatcher.
    ///
    /// # Errors
    ///
    /// Returned errors become `Err` responses carrying the error message.
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Command, &mut HandlerContext<'_>) -> Result<HandlerOutcome, HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        self(command, context)
    }
}

/// Immutable mapping from command id to handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<u8, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    #[must_use]
    pub fn get(&self, command_id: u8) -> Option<&dyn CommandHandler> {
        self.handlers.get(&command_id).map(AsRef::as_ref)
    }

    /// Registered command ids in ascending order.
    #[must_use]
    pub fn command_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.handlers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HandlerRegistry")
            .field("command_ids", &self.command_ids())
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<u8, Arc<dyn CommandHandler>>,
}

impl RegistryBuilder {
    /// Registers `handler` for `command`, replacing any earlier registration.
    #[must_use]
    pub fn register(mut self, command: TraciCommand, handler: Arc<dyn CommandHandler>) -> Self {
        if self.handlers.insert(command.id(), handler).is_some() {
            warn!(
                target: DISPATCH_TARGET,
                command = command.name(),
                "handler registered twice; keeping the latest"
            );
        }
        self
    }

    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}
