//! Shared fixtures for unit and behavioural suites.

mod client;
mod config_loader;
mod harness;
mod reporter;
mod scenarios;

pub use client::{RunningServer, SessionClient};
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use harness::SessionHarness;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use scenarios::{CORRIDOR, SHORT_RUN, scenario_command, scenario_file};
