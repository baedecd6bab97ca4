//! Filesystem worker that runs inside a container and answers JSON requests.
//!
//! A controller on the other end of a pipe writes one JSON request per line
//! to the worker's stdin and reads one JSON response per line from its stdout.
//! Each request carries a caller-chosen `ticket` that is echoed on the
//! matching response; responses are emitted in completion order, so callers
//! correlate by ticket rather than by position.
//!
//! The crate is layered as follows:
//!
//! - The transport loop reads request lines and hands them to the worker pool.
//! - [`dispatch`] decodes requests, looks them up in the [`CommandRegistry`],
//!   runs them on a bounded pool of threads, and serialises one response per
//!   request through a single output guard.
//! - [`commands`] holds the built-in filesystem operations.
//!
//! Logs go to stderr only; stdout belongs to the protocol.

mod bootstrap;
pub mod commands;
pub mod dispatch;
mod health;
mod telemetry;
mod transport;
mod workdir;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, Worker, bootstrap_with,
};
pub use dispatch::{CommandRegistry, DispatchError, PoolError, RegistryError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::SessionStats;
pub use workdir::WorkingDirectory;

#[cfg(test)]
mod tests;
