//! Structured health reporting for daemon and session lifecycle events.

use std::sync::Arc;

use stride_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::session::ConnectionId;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for lifecycle events, so tests can record what operators see.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener accepts connections.
    fn listener_ready(&self, endpoint: &SocketEndpoint);

    /// Invoked when a client connection becomes a session.
    fn session_opened(&self, connection: ConnectionId);

    /// Invoked after a session has released its simulation.
    fn session_closed(&self, connection: ConnectionId);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        (**self).listener_ready(endpoint);
    }

    fn session_opened(&self, connection: ConnectionId) {
        (**self).session_opened(connection);
    }

    fn session_closed(&self, connection: ConnectionId) {
        (**self).session_closed(connection);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.listen_socket(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            scenario_root = ?config.scenario_root(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            endpoint = %endpoint,
            "accepting remote-control clients"
        );
    }

    fn session_opened(&self, connection: ConnectionId) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_opened",
            %connection,
            "client session opened"
        );
    }

    fn session_closed(&self, connection: ConnectionId) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_closed",
            %connection,
            "client session closed"
        );
    }
}
