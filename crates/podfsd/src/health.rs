//! Structured health reporting for worker lifecycle events.

use std::sync::Arc;

use podfs_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::SessionStats;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the worker pool is running and the transport is about to read.
    fn session_started(&self, workers: usize, queue_depth: usize);

    /// Invoked after the input stream closed and every queued request was answered.
    fn session_finished(&self, stats: &SessionStats);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
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

    fn session_started(&self, workers: usize, queue_depth: usize) {
        (**self).session_started(workers, queue_depth);
    }

    fn session_finished(&self, stats: &SessionStats) {
        (**self).session_finished(stats);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
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
            "starting worker bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            size_limit = config.size_limit(),
            prefetch_budget = config.prefetch_budget(),
            "worker bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "worker bootstrap failed"
        );
    }

    fn session_started(&self, workers: usize, queue_depth: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            workers,
            queue_depth,
            "serving requests on stdio"
        );
    }

    fn session_finished(&self, stats: &SessionStats) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_finished",
            accepted = stats.accepted,
            rejected = stats.rejected,
            "input closed, all requests answered"
        );
    }
}
