//! Test harness utilities for the worker behaviour suites.

use std::ffi::OsString;
use std::io::{self, Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use serde_json::Value;
use tempfile::TempDir;

use podfs_config::{Config, LogFormat};

use crate::bootstrap::{BootstrapError, ConfigLoader, StaticConfigLoader, Worker, bootstrap_with};
use crate::health::HealthReporter;
use crate::transport::SessionStats;
use crate::workdir::WorkingDirectory;

/// Configuration used by the behaviour suites.
pub fn test_config() -> Config {
    Config {
        log_filter: "warn".to_owned(),
        log_format: LogFormat::Compact,
        workers: 4,
        queue_depth: 8,
        ..Config::default()
    }
}

/// Loader that intentionally fails by passing an unparsable CLI value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("podfsd"),
            OsString::from("--workers"),
            OsString::from("several"),
        ];
        Config::load_from_iter(args)
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_started(&self, workers: usize, queue_depth: usize) {
        self.record(HealthEvent::SessionStarted {
            workers,
            queue_depth,
        });
    }

    fn session_finished(&self, stats: &SessionStats) {
        self.record(HealthEvent::SessionFinished(*stats));
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The transport started reading.
    SessionStarted { workers: usize, queue_depth: usize },
    /// The input stream closed and the pool drained.
    SessionFinished(SessionStats),
}

/// Cloneable sink shared between a session and its assertions.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().expect("buffer mutex poisoned").clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .expect("buffer mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A bootstrapped worker rooted in a scratch directory.
pub struct Session {
    pub dir: TempDir,
    pub reporter: Arc<RecordingHealthReporter>,
    worker: Worker,
}

impl Session {
    /// Boots a worker with [`test_config`].
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Boots a worker with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        let dir = TempDir::new().expect("create scratch dir");
        let reporter = Arc::new(RecordingHealthReporter::default());
        let worker = bootstrap_with(&StaticConfigLoader::new(config), reporter.clone())
            .expect("bootstrap should succeed")
            .with_working_directory(WorkingDirectory::new(dir.path()));
        Self {
            dir,
            reporter,
            worker,
        }
    }

    /// Scratch directory backing relative paths.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Feeds `lines` to the worker and returns the raw output once it drains.
    pub fn exchange_raw<I, S>(&self, lines: I) -> (SessionStats, Vec<u8>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut input = String::new();
        for line in lines {
            input.push_str(line.as_ref());
            input.push('\n');
        }
        let output = SharedBuffer::default();
        let stats = self
            .worker
            .serve(Cursor::new(input.into_bytes()), output.clone())
            .expect("serve should finish cleanly");
        (stats, output.contents())
    }

    /// Feeds `lines` to the worker and decodes every response.
    pub fn exchange<I, S>(&self, lines: I) -> Vec<Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (_, raw) = self.exchange_raw(lines);
        decode_lines(&raw)
    }

    /// Sends a single request and returns its response.
    pub fn request(&self, request: &Value) -> Value {
        let mut responses = self.exchange([request.to_string()]);
        assert_eq!(responses.len(), 1, "expected exactly one response");
        responses.remove(0)
    }
}

/// Decodes newline-delimited JSON responses.
pub fn decode_lines(raw: &[u8]) -> Vec<Value> {
    raw.split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).expect("response line is JSON"))
        .collect()
}

/// Finds the response carrying `ticket`.
pub fn by_ticket(responses: &[Value], ticket: i64) -> &Value {
    responses
        .iter()
        .find(|response| response["ticket"] == ticket)
        .unwrap_or_else(|| panic!("no response for ticket {ticket}"))
}
