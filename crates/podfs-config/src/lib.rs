//! Shared configuration for the pod filesystem worker.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file (`--config-path` or `PODFS_CONFIG_PATH`), then
//! `PODFS_*` environment variables, then command-line flags. The worker reads
//! requests from stdin, so every tunable here is supplied at launch and never
//! over the protocol channel.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PREFETCH_BUDGET, DEFAULT_QUEUE_DEPTH, DEFAULT_SIZE_LIMIT,
    DEFAULT_WORKERS, default_log_filter, default_log_filter_string, default_log_format,
    default_prefetch_budget, default_queue_depth, default_size_limit, default_workers,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PODFS")]
pub struct Config {
    /// `tracing` filter directive applied to stderr logging.
    #[ortho_config(default = defaults::default_log_filter_string())]
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for stderr logging.
    #[ortho_config(default = defaults::default_log_format())]
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Files larger than this many bytes are not read and are flagged read-only.
    #[ortho_config(default = defaults::DEFAULT_SIZE_LIMIT)]
    #[serde(default = "defaults::default_size_limit")]
    pub size_limit: u64,
    /// Byte budget for directory listings embedded in `mstat` replies.
    #[ortho_config(default = defaults::DEFAULT_PREFETCH_BUDGET)]
    #[serde(default = "defaults::default_prefetch_budget")]
    pub prefetch_budget: usize,
    /// Number of dispatch worker threads.
    #[ortho_config(default = defaults::DEFAULT_WORKERS)]
    #[serde(default = "defaults::default_workers")]
    pub workers: usize,
    /// Accepted requests that may wait for a free worker.
    #[ortho_config(default = defaults::DEFAULT_QUEUE_DEPTH)]
    #[serde(default = "defaults::default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            size_limit: DEFAULT_SIZE_LIMIT,
            prefetch_budget: DEFAULT_PREFETCH_BUDGET,
            workers: DEFAULT_WORKERS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Filter directive for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Selected log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Size limit in bytes.
    #[must_use]
    pub const fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// Prefetch budget in bytes.
    #[must_use]
    pub const fn prefetch_budget(&self) -> usize {
        self.prefetch_budget
    }

    /// Worker thread count.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Queue depth between the reader and the workers.
    #[must_use]
    pub const fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Checks that the loaded values can drive a worker.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroValue`] when a count or limit that must be
    /// positive is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroValue { field: "workers" });
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::ZeroValue {
                field: "queue_depth",
            });
        }
        if self.size_limit == 0 {
            return Err(ConfigError::ZeroValue {
                field: "size_limit",
            });
        }
        Ok(())
    }
}

/// Semantic validation failures for an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field that must be positive was zero.
    #[error("configuration field '{field}' must be greater than zero")]
    ZeroValue {
        /// Name of the offending field.
        field: &'static str,
    },
}
