//! Remote-control server for a pedestrian simulation.
//!
//! Clients connect over TCP (or a Unix socket), negotiate a protocol
//! version, load a scenario and then drive the simulation step by step,
//! reading and writing pedestrian, obstacle and simulation state between
//! steps. Each connection is an independent [`session::Session`] with its
//! own [`gateway::SimulationGateway`] and subscriptions.
//!
//! The moving parts:
//!
//! - [`dispatch`] routes each decoded command to a handler and always
//!   produces exactly one response, even when the handler fails or panics.
//! - [`domains`] holds the per-domain handlers and the control state
//!   machine (version, load, step, state, close).
//! - [`subscription`] keeps variable subscriptions and evaluates them by
//!   re-entering the dispatcher with stored Get commands after each step.
//! - [`gateway`] owns the simulation and its stepping thread and serialises
//!   every state access with the step loop.
//! - [`world`] defines the simulation boundary and ships a small kinematic
//!   simulation loaded from JSON scenario files.
//!
//! Bootstrap, telemetry, health reporting and the socket listener are
//! wired together by [`run_daemon`].

pub mod bootstrap;
pub mod dispatch;
pub mod domains;
pub mod gateway;
mod health;
mod process;
pub mod session;
pub mod subscription;
mod telemetry;
pub mod transport;
pub mod world;

pub use bootstrap::{
    ArgsConfigLoader, BootstrapError, ConfigLoader, Daemon, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with, bootstrap_with_source,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
