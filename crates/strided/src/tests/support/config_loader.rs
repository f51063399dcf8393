//! Configuration loaders covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use stride_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that listens on a Unix socket under a temporary directory, or on
/// an ephemeral loopback TCP port.
pub struct TestConfigLoader {
    socket_dir: TempDir,
    tcp: bool,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let socket_dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            socket_dir,
            tcp: false,
        }
    }

    #[must_use]
    pub fn tcp() -> Self {
        Self {
            tcp: true,
            ..Self::new()
        }
    }

    pub fn socket_path(&self) -> String {
        let path = self.socket_dir.path().join("strided.sock");
        path.to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let listen_socket = if self.tcp {
            SocketEndpoint::tcp("127.0.0.1", 0)
        } else {
            SocketEndpoint::unix(self.socket_path())
        };
        Ok(Config {
            listen_socket,
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an invalid socket URL on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("strided"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
