//! Routes a decoded command to its handler and always produces a response.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use stride_protocol::{Command, Response};
use tracing::{debug, error, warn};

use crate::session::Session;

use super::DISPATCH_TARGET;
use super::context::HandlerContext;
use super::outcome::HandlerOutcome;
use super::registry::HandlerRegistry;

/// Client-facing description of a handler panic.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "internal error while handling command; see server log for details";

/// Shared command dispatcher.
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Executes `command` for `session`.
    ///
    /// Never fails: lookup misses, handler errors, handler panics and
    /// malformed handler results are all answered with an `Err` response.
    pub fn execute(&self, command: &Command, session: &mut Session) -> Response {
        let command_id = command.command_id();
        if session.is_closing() {
            return error_response(command, "session is closing");
        }
        let Some(handler) = self.registry.get(command_id) else {
            warn!(
                target: DISPATCH_TARGET,
                connection = %session.id(),
                command_id,
                "no handler registered"
            );
            return error_response(command, "ID not found");
        };

        debug!(
            target: DISPATCH_TARGET,
            connection = %session.id(),
            command_id,
            variable_id = command.variable_id(),
            element_id = command.element_id(),
            "dispatching command"
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut context = HandlerContext::new(self, session);
            handler.handle(command, &mut context)
        }));
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(failure)) => {
                debug!(
                    target: DISPATCH_TARGET,
                    command_id,
                    error = %failure,
                    "command failed"
                );
                HandlerOutcome::error(failure.to_string())
            }
            Err(payload) => {
                error!(
                    target: DISPATCH_TARGET,
                    command_id,
                    panic = panic_message(payload.as_ref()),
                    "handler panicked"
                );
                HandlerOutcome::error(INTERNAL_ERROR_MESSAGE)
            }
        };

        outcome.render(command).unwrap_or_else(|failure| {
            error!(
                target: DISPATCH_TARGET,
                command_id,
                error = %failure,
                "handler produced an unrenderable result"
            );
            error_response(command, format!("error building response: {failure}"))
        })
    }
}

fn error_response(command: &Command, description: impl Into<String>) -> Response {
    Response::err(command.command_id(), description)
        .with_variable(command.variable_id())
        .with_element(command.element_id().map(str::to_owned))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
