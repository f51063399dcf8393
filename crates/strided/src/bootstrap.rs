//! Daemon bootstrap orchestration.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use stride_config::{Config, SocketPreparationError};

use crate::dispatch::{Dispatcher, SessionConnectionHandler};
use crate::domains::standard_registry;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::world::{JsonScenarioSource, ScenarioSource};

/// Abstracts configuration loading so tests can inject fixed settings.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when a source is malformed.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads CLI flags, `STRIDE_*` variables and the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that parses an explicit argument list instead of the process
/// arguments.
#[derive(Debug, Clone)]
pub struct ArgsConfigLoader {
    args: Vec<OsString>,
}

impl ArgsConfigLoader {
    #[must_use]
    pub fn new(args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConfigLoader for ArgsConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.args.clone())
    }
}

/// Loader that hands out an already resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// The socket directory could not be prepared.
    #[error("failed to prepare listen socket: {source}")]
    Socket {
        #[source]
        source: SocketPreparationError,
    },
}

/// A bootstrapped daemon, ready to serve sessions.
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    dispatcher: Arc<Dispatcher>,
    scenarios: Arc<dyn ScenarioSource>,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, mainly useful in tests.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn scenarios(&self) -> &Arc<dyn ScenarioSource> {
        &self.scenarios
    }

    #[must_use]
    pub fn reporter(&self) -> &Arc<dyn HealthReporter> {
        &self.reporter
    }

    /// Builds the handler the listener runs for each accepted connection.
    #[must_use]
    pub fn connection_handler(&self) -> Arc<SessionConnectionHandler> {
        Arc::new(SessionConnectionHandler::new(
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.scenarios),
            Arc::clone(&self.reporter),
        ))
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Daemon")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the daemon with the JSON scenario source rooted at the
/// configured scenario directory.
///
/// # Errors
///
/// Fails when configuration, telemetry or socket preparation fails; the
/// reporter sees the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    bootstrap_with_source(loader, reporter, |config| -> Arc<dyn ScenarioSource> {
        Arc::new(JsonScenarioSource::new(
            config.scenario_root().map(camino::Utf8Path::to_path_buf),
        ))
    })
}

/// Bootstraps the daemon with a caller-supplied scenario source.
///
/// # Errors
///
/// See [`bootstrap_with`].
pub fn bootstrap_with_source(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    scenarios: impl FnOnce(&Config) -> Arc<dyn ScenarioSource>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.listen_socket().prepare_filesystem() {
        let error = BootstrapError::Socket { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let dispatcher = Arc::new(Dispatcher::new(standard_registry()));
    let scenarios = scenarios(&config);
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        telemetry,
        dispatcher,
        scenarios,
        reporter,
    })
}
