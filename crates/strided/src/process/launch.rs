//! Launch sequencing for the daemon runtime.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::SocketListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Runs the daemon in the foreground with the production collaborators.
///
/// # Errors
///
/// Fails when bootstrap, listener setup or signal installation fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &SystemShutdownSignal)
}

/// Runs the daemon with injected collaborators.
///
/// Blocks until `shutdown` returns, then stops accepting connections and
/// gives open sessions a grace period to finish before returning. Sessions
/// still open after the grace period are abandoned to their threads.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %daemon.config().listen_socket(),
        "starting daemon runtime"
    );

    let listener = SocketListener::bind(daemon.config().listen_socket())?;
    let endpoint = listener.local_endpoint();
    let handle = listener.start(daemon.connection_handler())?;
    daemon.reporter().listener_ready(&endpoint);

    let waited = shutdown.wait();
    handle.shutdown();
    let abandoned = handle.drain(SHUTDOWN_TIMEOUT);
    if abandoned > 0 {
        warn!(
            target: PROCESS_TARGET,
            sessions = abandoned,
            grace_ms = SHUTDOWN_TIMEOUT.as_millis(),
            "sessions still open after the grace period"
        );
    }
    handle.join()?;
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
