//! Per-connection control session.
//!
//! ```text
//! Unconnected -> VersionNegotiated -> ScenarioLoaded -> Running <-> SteppedPaused
//!                                                         |
//!                               Close / EOF -> ClosingWaitForEof -> Closed
//! ```

use std::fmt;
use std::mem;

use stride_protocol::{ProtocolVersion, SubscriptionSnapshot};
use tracing::info;

use crate::dispatch::{Dispatcher, HandlerError};
use crate::gateway::SimulationGateway;
use crate::subscription::SubscriptionEngine;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Identifier of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "conn-{}", self.0)
    }
}

/// Where a session is in the control lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unconnected,
    VersionNegotiated,
    ScenarioLoaded,
    /// A `SimStep` is being executed.
    Running,
    /// Between steps; the client may read, write and subscribe.
    SteppedPaused,
    /// `Close` received; every further command is refused.
    ClosingWaitForEof,
    Closed,
}

/// State owned by one client connection.
#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    phase: SessionPhase,
    version: Option<ProtocolVersion>,
    gateway: SimulationGateway,
    subscriptions: SubscriptionEngine,
}

impl Session {
    #[must_use]
    pub fn new(id: ConnectionId, gateway: SimulationGateway) -> Self {
        Self {
            id,
            phase: SessionPhase::Unconnected,
            version: None,
            gateway,
            subscriptions: SubscriptionEngine::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            info!(
                target: SESSION_TARGET,
                connection = %self.id,
                from = ?self.phase,
                to = ?phase,
                "session phase changed"
            );
            self.phase = phase;
        }
    }

    /// Protocol version the client announced with its first `GetVersion`.
    #[must_use]
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    pub(crate) fn negotiate(&mut self, version: ProtocolVersion) {
        self.version = Some(version);
        if self.phase == SessionPhase::Unconnected {
            self.set_phase(SessionPhase::VersionNegotiated);
        }
    }

    #[must_use]
    pub fn is_closing(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::ClosingWaitForEof | SessionPhase::Closed
        )
    }

    /// Ensures a scenario is loaded and the session is between steps.
    ///
    /// # Errors
    ///
    /// Returns a protocol error naming why the session cannot proceed.
    pub fn require_scenario(&self) -> Result<(), HandlerError> {
        match self.phase {
            SessionPhase::ScenarioLoaded | SessionPhase::SteppedPaused => Ok(()),
            SessionPhase::Unconnected | SessionPhase::VersionNegotiated => {
                Err(HandlerError::protocol("no scenario loaded"))
            }
            SessionPhase::Running => Err(HandlerError::protocol("simulation step in progress")),
            SessionPhase::ClosingWaitForEof | SessionPhase::Closed => {
                Err(HandlerError::protocol("session is closing"))
            }
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &SimulationGateway {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut SimulationGateway {
        &mut self.gateway
    }

    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionEngine {
        &self.subscriptions
    }

    pub fn subscriptions_mut(&mut self) -> &mut SubscriptionEngine {
        &mut self.subscriptions
    }

    /// Evaluates every subscription against the current state.
    ///
    /// The engine is detached from the session while its templates run
    /// through `dispatcher`, so the Get handlers see the session but not the
    /// subscriptions being evaluated.
    pub(crate) fn evaluate_subscriptions(
        &mut self,
        dispatcher: &Dispatcher,
    ) -> Vec<SubscriptionSnapshot> {
        let mut subscriptions = mem::take(&mut self.subscriptions);
        let snapshots = subscriptions.evaluate_all(dispatcher, self);
        subscriptions.absorb(mem::take(&mut self.subscriptions));
        self.subscriptions = subscriptions;
        snapshots
    }

    /// Tears the session down after the client disconnected.
    pub fn close(&mut self) {
        self.gateway.mark_client_close_received();
        self.gateway.stop_simulation_if_running();
        self.subscriptions.clear();
        self.set_phase(SessionPhase::Closed);
    }
}
