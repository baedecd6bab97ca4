//! Request dispatch for the stdio worker.
//!
//! This module turns decoded request lines into responses. It owns the
//! request/response envelope, the immutable command registry, the per-request
//! dispatch units, and the bounded pool of threads that runs them.
//!
//! ## Protocol
//!
//! The controller writes one JSON object per line:
//!
//! ```json
//! {"ticket":1,"cmd":"test"}
//! ```
//!
//! The worker answers each request with exactly one line, echoing the ticket:
//!
//! ```json
//! {"msg":"hello from pod","result":"I","ticket":1}
//! {"msg":"unknown command: nope","result":"E","ticket":2}
//! ```
//!
//! Responses are written in completion order, not arrival order; callers
//! correlate by ticket.

mod context;
mod errors;
mod handler;
mod pool;
mod registry;
mod request;
mod response;

pub use self::context::CommandContext;
pub use self::errors::DispatchError;
pub use self::handler::Dispatcher;
pub use self::pool::{PoolError, WorkerPool};
pub use self::registry::{
    Command, CommandRegistry, CommandRegistryBuilder, ErasedCommand, RegistryError, Reply,
    into_reply,
};
pub use self::request::{RejectedRequest, Request, Ticket};
pub use self::response::{Response, ResponseWriter};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
