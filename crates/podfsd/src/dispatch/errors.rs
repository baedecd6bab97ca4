//! Error types for request dispatch failures.
//!
//! Every variant is converted into an `E` response at the dispatch boundary;
//! the `Display` text becomes the wire `msg` field verbatim. None of these
//! errors terminate the worker.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced while decoding or executing a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request line was not a usable JSON object.
    #[error("malformed request: {message}")]
    MalformedRequest {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// No command is registered under the requested name.
    #[error("unknown command: {command}")]
    UnknownCommand { command: String },

    /// Supplied arguments do not match the command's argument schema.
    #[error("invalid arguments for '{command}': {message}")]
    InvalidArguments { command: String, message: String },

    /// The underlying filesystem call failed.
    #[error("{source}: {}", .path.display())]
    OperationFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error while writing a response.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),

    /// Internal error (e.g., lock poisoned or handler panic).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    /// Creates a malformed request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid arguments error.
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Returns a mapper that attaches `path` to an OS error.
    ///
    /// Intended for `map_err` on filesystem calls:
    /// `fs::read(&path).map_err(DispatchError::at(&path))`.
    pub fn at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::OperationFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "malformed_request",
            Self::UnknownCommand { .. } => "unknown_command",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::OperationFailure { .. } => "operation_failure",
            Self::Io(_) => "io",
            Self::SerializeResponse(_) => "serialize_response",
            Self::Internal { .. } => "internal",
        }
    }
}
