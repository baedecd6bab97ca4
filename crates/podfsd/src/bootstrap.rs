//! Worker bootstrap orchestration.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use podfs_config::{Config, ConfigError};

use crate::commands::filesystem_registry;
use crate::dispatch::{
    CommandContext, CommandRegistry, Dispatcher, PoolError, RegistryError, WorkerPool,
};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError};
use crate::transport::{self, SessionStats};
use crate::workdir::WorkingDirectory;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
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
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {source}")]
    InvalidConfiguration {
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The command registry could not be assembled.
    #[error("failed to build command registry: {source}")]
    Registry {
        /// Registration conflict.
        #[source]
        source: RegistryError,
    },
    /// The launch directory could not be determined.
    #[error("failed to resolve working directory: {source}")]
    WorkingDirectory {
        /// OS error from the directory lookup.
        #[source]
        source: io::Error,
    },
}

/// A bootstrapped worker ready to serve a request stream.
pub struct Worker {
    config: Config,
    registry: CommandRegistry,
    context: CommandContext,
    reporter: Arc<dyn HealthReporter>,
}

impl Worker {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registered commands.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Shared state handed to every command.
    #[must_use]
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Resolves relative request paths against `workdir` instead of the
    /// launch directory.
    #[must_use]
    pub fn with_working_directory(mut self, workdir: WorkingDirectory) -> Self {
        self.context = CommandContext::from_config(&self.config, workdir);
        self
    }

    /// Serves requests from `input` until end-of-stream, answering on `output`.
    ///
    /// Returns once every accepted request has been answered.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] if the dispatch workers cannot be started or one
    /// of them terminated abnormally.
    pub fn serve<R, W>(&self, input: R, output: W) -> Result<SessionStats, PoolError>
    where
        R: BufRead,
        W: Write + Send,
    {
        let workers = self.config.workers();
        let queue_depth = self.config.queue_depth();
        let dispatcher = Dispatcher::new(&self.registry, &self.context, output);

        let stats = thread::scope(|scope| {
            let pool = WorkerPool::start(scope, &dispatcher, workers, queue_depth)?;
            self.reporter.session_started(workers, queue_depth);
            let stats = transport::serve(input, &dispatcher, &pool);
            pool.shutdown()?;
            Ok::<_, PoolError>(stats)
        })?;

        self.reporter.session_finished(&stats);
        Ok(stats)
    }
}

/// Bootstraps the worker using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] for the first stage that fails; the reporter
/// is told about it before this returns.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Worker, BootstrapError> {
    reporter.bootstrap_starting();
    match assemble(loader, &reporter) {
        Ok(worker) => {
            reporter.bootstrap_succeeded(&worker.config);
            Ok(worker)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn assemble(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
) -> Result<Worker, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    config
        .validate()
        .map_err(|source| BootstrapError::InvalidConfiguration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let registry = filesystem_registry().map_err(|source| BootstrapError::Registry { source })?;
    let workdir = WorkingDirectory::from_process()
        .map_err(|source| BootstrapError::WorkingDirectory { source })?;
    let context = CommandContext::from_config(&config, workdir);

    Ok(Worker {
        config,
        registry,
        context,
        reporter: Arc::clone(reporter),
    })
}
