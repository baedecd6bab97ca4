//! Dispatch units: one request in, exactly one response out.
//!
//! The [`Dispatcher`] owns the response writer and borrows the registry and
//! command context. Worker threads call [`Dispatcher::run`] once per request;
//! the transport loop calls [`Dispatcher::reject`] for lines that never became
//! requests. Failures, including handler panics, are confined to the unit that
//! raised them.

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::context::CommandContext;
use super::errors::DispatchError;
use super::registry::{CommandRegistry, Reply};
use super::request::{RejectedRequest, Request, Ticket};
use super::response::{Response, ResponseWriter};
use super::DISPATCH_TARGET;

/// Executes requests against the registry and emits their responses.
#[derive(Debug)]
pub struct Dispatcher<'a, W> {
    registry: &'a CommandRegistry,
    context: &'a CommandContext,
    writer: ResponseWriter<W>,
}

impl<'a, W: Write> Dispatcher<'a, W> {
    /// Creates a dispatcher writing responses to `output`.
    pub fn new(registry: &'a CommandRegistry, context: &'a CommandContext, output: W) -> Self {
        Self {
            registry,
            context,
            writer: ResponseWriter::new(output),
        }
    }

    /// Runs one request to completion and emits its response.
    pub fn run(&self, request: Request) {
        let ticket = request.ticket();
        let command = request.command().to_owned();
        debug!(target: DISPATCH_TARGET, %ticket, command = %command, "dispatching request");

        let response = match self.execute(request) {
            Ok(reply) => Response::success(ticket, reply),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %ticket,
                    command = %command,
                    kind = error.kind(),
                    %error,
                    "request failed"
                );
                Response::failure(Some(ticket), &error)
            }
        };
        self.emit(&response);
    }

    /// Emits the error response for a line that failed to decode.
    pub fn reject(&self, rejected: &RejectedRequest) {
        warn!(
            target: DISPATCH_TARGET,
            ticket = rejected.ticket.map(Ticket::get),
            error = %rejected.error,
            "rejected request line"
        );
        self.emit(&Response::failure(rejected.ticket, &rejected.error));
    }

    /// Emits a failure for an accepted request that could not be scheduled.
    pub fn fail(&self, ticket: Ticket, error: &DispatchError) {
        warn!(target: DISPATCH_TARGET, %ticket, %error, "request not scheduled");
        self.emit(&Response::failure(Some(ticket), error));
    }

    /// Releases the underlying output stream.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Internal` if the output guard was poisoned.
    pub fn into_output(self) -> Result<W, DispatchError> {
        self.writer.into_inner()
    }

    fn execute(&self, request: Request) -> Result<Reply, DispatchError> {
        let (_, name, arguments) = request.into_parts();
        let command = self.registry.lookup(&name)?;
        panic::catch_unwind(AssertUnwindSafe(|| command.invoke(arguments, self.context)))
            .unwrap_or_else(|payload| {
                Err(DispatchError::internal(format!(
                    "command '{name}' panicked: {}",
                    panic_message(payload.as_ref())
                )))
            })
    }

    fn emit(&self, response: &Response) {
        if let Err(error) = self.writer.emit(response) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
