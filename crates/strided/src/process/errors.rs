use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Why the daemon stopped abnormally.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("daemon bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("socket listener failed: {0}")]
    Listener(#[from] ListenerError),
    #[error("failed to await shutdown signal: {0}")]
    Shutdown(#[from] ShutdownError),
}
