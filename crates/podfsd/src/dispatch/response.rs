//! Response serialization and the shared output guard.
//!
//! Every response is one JSON object on one line. Success responses carry
//! `"result":"I"` plus the command's fields; failures carry `"result":"E"` and
//! a `msg`. The ticket is echoed whenever it is known.

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::DispatchError;
use super::registry::Reply;
use super::request::Ticket;

const RESULT_FIELD: &str = "result";
const TICKET_FIELD: &str = "ticket";
const MESSAGE_FIELD: &str = "msg";
const SUCCESS_TAG: &str = "I";
const FAILURE_TAG: &str = "E";

/// A single response record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Response {
    fields: Map<String, Value>,
}

impl Response {
    /// Builds a success response, merging the envelope over the reply fields.
    pub fn success(ticket: Ticket, reply: Reply) -> Self {
        let mut fields = reply;
        fields.insert(RESULT_FIELD.to_owned(), Value::from(SUCCESS_TAG));
        fields.insert(TICKET_FIELD.to_owned(), Value::from(ticket.get()));
        Self { fields }
    }

    /// Builds a failure response from a dispatch error.
    pub fn failure(ticket: Option<Ticket>, error: &DispatchError) -> Self {
        let mut fields = Map::new();
        fields.insert(RESULT_FIELD.to_owned(), Value::from(FAILURE_TAG));
        if let Some(ticket) = ticket {
            fields.insert(TICKET_FIELD.to_owned(), Value::from(ticket.get()));
        }
        fields.insert(MESSAGE_FIELD.to_owned(), Value::from(error.to_string()));
        Self { fields }
    }

    /// Returns `true` for `I` responses.
    pub fn is_success(&self) -> bool {
        self.fields.get(RESULT_FIELD).and_then(Value::as_str) == Some(SUCCESS_TAG)
    }

    /// Echoed ticket, if present.
    pub fn ticket(&self) -> Option<Ticket> {
        self.fields
            .get(TICKET_FIELD)
            .and_then(Value::as_i64)
            .map(Ticket::new)
    }

    /// Looks up a response field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Encodes the response as one newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::SerializeResponse` if encoding fails.
    pub fn to_line(&self) -> Result<Vec<u8>, DispatchError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Single serialization point for the shared output stream.
///
/// The guard is held only while one already-encoded line is written and
/// flushed, so concurrent units never interleave partial lines.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: Mutex<W>,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self {
            sink: Mutex::new(writer),
        }
    }

    /// Writes one response line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing, or flushing fails, or if
    /// the guard was poisoned by a panicking writer.
    pub fn emit(&self, response: &Response) -> Result<(), DispatchError> {
        let line = response.to_line()?;
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| DispatchError::internal("response writer lock poisoned"))?;
        sink.write_all(&line)?;
        sink.flush()?;
        Ok(())
    }

    /// Releases the wrapped stream.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Internal` if the guard was poisoned.
    pub fn into_inner(self) -> Result<W, DispatchError> {
        self.sink
            .into_inner()
            .map_err(|_| DispatchError::internal("response writer lock poisoned"))
    }
}
