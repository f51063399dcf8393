//! In-process session driver for handler-level tests.

use std::sync::Arc;

use stride_protocol::{Command, CommandPayload, Response, Status, TraciCommand, Value};

use crate::dispatch::Dispatcher;
use crate::domains::standard_registry;
use crate::gateway::SimulationGateway;
use crate::session::{ConnectionId, Session};
use crate::world::{JsonScenarioSource, ScenarioSource};

use super::scenarios::scenario_command;

/// Owns a dispatcher and one session, and sends commands through
/// [`Dispatcher::execute`] exactly as a connection would.
pub struct SessionHarness {
    dispatcher: Dispatcher,
    session: Session,
}

impl SessionHarness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            Dispatcher::new(standard_registry()),
            Arc::new(JsonScenarioSource::new(None)),
        )
    }

    #[must_use]
    pub fn with_parts(dispatcher: Dispatcher, source: Arc<dyn ScenarioSource>) -> Self {
        let session = Session::new(ConnectionId::new(1), SimulationGateway::new(source));
        Self {
            dispatcher,
            session,
        }
    }

    /// Builds a harness with `scenario` already loaded.
    #[must_use]
    pub fn loaded(scenario: &str) -> Self {
        let mut harness = Self::new();
        let response = harness.execute(&scenario_command(scenario));
        assert_eq!(
            response.status(),
            Status::Ok,
            "scenario should load: {}",
            response.description()
        );
        harness
    }

    pub fn execute(&mut self, command: &Command) -> Response {
        self.dispatcher.execute(command, &mut self.session)
    }

    pub fn get(&mut self, command: TraciCommand, variable: u8, element: &str) -> Response {
        self.execute(
            &Command::new(command.id())
                .with_variable(variable)
                .with_element(element),
        )
    }

    pub fn set(
        &mut self,
        command: TraciCommand,
        variable: u8,
        element: &str,
        value: Value,
    ) -> Response {
        self.execute(
            &Command::new(command.id())
                .with_variable(variable)
                .with_element(element)
                .with_payload(CommandPayload::Value(value)),
        )
    }

    pub fn subscribe(
        &mut self,
        command: TraciCommand,
        element: &str,
        variables: &[u8],
    ) -> Response {
        self.execute(
            &Command::new(command.id())
                .with_element(element)
                .with_payload(CommandPayload::Variables(variables.to_vec())),
        )
    }

    pub fn step(&mut self, target: f64) -> Response {
        self.execute(
            &Command::new(TraciCommand::SimStep.id())
                .with_payload(CommandPayload::TargetTime(target)),
        )
    }

    pub fn control(&mut self, command: TraciCommand) -> Response {
        self.execute(&Command::new(command.id()))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for SessionHarness {
    fn drop(&mut self) {
        self.session.close();
    }
}
