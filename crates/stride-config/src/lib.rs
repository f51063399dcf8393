//! Layered configuration for the stride control daemon.
//!
//! Values resolve in the order CLI flags, `STRIDE_*` environment variables,
//! a TOML configuration file (`--config-path`), then built-in defaults.

mod defaults;
mod logging;
mod socket;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_HOST, DEFAULT_TCP_PORT, default_listen_socket,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "STRIDE")]
pub struct Config {
    /// Endpoint clients connect to.
    #[serde(default = "default_listen_socket")]
    #[ortho_config(default = default_listen_socket())]
    pub listen_socket: SocketEndpoint,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Directory relative scenario paths given to `Load` resolve against.
    #[serde(default)]
    pub scenario_root: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_listen_socket(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            scenario_root: None,
        }
    }
}

impl Config {
    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Root directory for relative scenario paths, if configured.
    #[must_use]
    pub fn scenario_root(&self) -> Option<&camino::Utf8Path> {
        self.scenario_root.as_deref()
    }
}
