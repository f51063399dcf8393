use thiserror::Error;

use crate::world::{ScenarioError, SimulationError};

/// Errors surfaced by the simulation gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No scenario has been loaded on this connection.
    #[error("no scenario loaded")]
    NoScenario,
    /// A scenario is already loaded; each connection drives one scenario.
    #[error("scenario already loaded")]
    AlreadyLoaded,
    /// The stepping loop has not been started.
    #[error("simulation has not been started")]
    NotStarted,
    /// The stepping loop exited unexpectedly.
    #[error("simulation loop terminated unexpectedly")]
    LoopTerminated,
    /// The stepping thread could not be spawned.
    #[error("failed to spawn simulation loop: {0}")]
    Spawn(#[source] std::io::Error),
    /// The scenario could not be turned into a simulation.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The model failed while stepping.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
