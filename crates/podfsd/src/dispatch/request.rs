//! Request decoding for the transport loop.
//!
//! A request line is a JSON object carrying an integer `ticket`, a string
//! `cmd`, and any number of command-specific fields. Decoding extracts the
//! ticket first so that later failures can still be correlated.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::DispatchError;

/// Caller-assigned correlation token echoed on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticket(i64);

impl Ticket {
    /// Wraps a raw ticket value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw ticket value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A decoded request ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    ticket: Ticket,
    command: String,
    arguments: Map<String, Value>,
}

/// A line that could not be turned into a [`Request`].
///
/// The ticket is kept whenever it was extracted before decoding failed.
#[derive(Debug)]
pub struct RejectedRequest {
    pub ticket: Option<Ticket>,
    pub error: DispatchError,
}

impl RejectedRequest {
    fn new(ticket: Option<Ticket>, error: DispatchError) -> Self {
        Self { ticket, error }
    }
}

impl Request {
    /// Builds a request directly; mainly useful for tests.
    pub fn new(ticket: Ticket, command: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            ticket,
            command: command.into(),
            arguments,
        }
    }

    /// Decodes one request line.
    ///
    /// Surrounding whitespace (including the newline delimiter) is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`RejectedRequest`] holding `DispatchError::MalformedRequest`
    /// when the line is not a JSON object, the ticket is missing or not an
    /// integer, or `cmd` is missing or not a string.
    pub fn parse(line: &[u8]) -> Result<Self, RejectedRequest> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(RejectedRequest::new(
                None,
                DispatchError::malformed("empty request line"),
            ));
        }

        let value: Value = serde_json::from_slice(trimmed)
            .map_err(|error| RejectedRequest::new(None, DispatchError::from_json_error(error)))?;
        let Value::Object(mut fields) = value else {
            return Err(RejectedRequest::new(
                None,
                DispatchError::malformed("request must be a JSON object"),
            ));
        };

        let ticket = match fields.remove("ticket") {
            Some(raw) => raw.as_i64().map(Ticket).ok_or_else(|| {
                RejectedRequest::new(None, DispatchError::malformed("ticket must be an integer"))
            })?,
            None => {
                return Err(RejectedRequest::new(
                    None,
                    DispatchError::malformed("missing 'ticket' field"),
                ));
            }
        };

        let command = match fields.remove("cmd") {
            Some(Value::String(command)) => command,
            Some(_) => {
                return Err(RejectedRequest::new(
                    Some(ticket),
                    DispatchError::malformed("'cmd' must be a string"),
                ));
            }
            None => {
                return Err(RejectedRequest::new(
                    Some(ticket),
                    DispatchError::malformed("missing 'cmd' field"),
                ));
            }
        };

        Ok(Self {
            ticket,
            command,
            arguments: fields,
        })
    }

    /// Returns `true` when the line holds nothing but whitespace.
    pub fn is_blank(line: &[u8]) -> bool {
        line.trim_ascii().is_empty()
    }

    /// Correlation ticket.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Requested command name.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Splits the request into its parts, handing over the argument map.
    pub fn into_parts(self) -> (Ticket, String, Map<String, Value>) {
        (self.ticket, self.command, self.arguments)
    }
}
