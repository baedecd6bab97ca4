//! Transport loop over the worker's stdio streams.
//!
//! A single reader pulls request lines, decodes them, and hands each accepted
//! request to the worker pool without waiting for it to finish. Lines that do
//! not decode are answered immediately from the reader thread.

mod reader;

use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::dispatch::{DispatchError, Dispatcher, Request, WorkerPool};

use self::reader::{Frame, LineReader};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Consecutive read failures tolerated before the stream is treated as closed.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 16;

/// Counters describing one transport session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Requests handed to the worker pool.
    pub accepted: u64,
    /// Lines answered from the transport: decode errors and requests no
    /// worker could take.
    pub rejected: u64,
}

/// Reads requests until end-of-stream, dispatching each through `pool`.
pub(crate) fn serve<R, W>(
    input: R,
    dispatcher: &Dispatcher<'_, W>,
    pool: &WorkerPool<'_>,
) -> SessionStats
where
    R: BufRead,
    W: Write,
{
    let mut reader = LineReader::new(input);
    let mut stats = SessionStats::default();
    let mut consecutive_errors = 0_u32;

    loop {
        let line = match reader.next_frame() {
            Ok(Frame::Line(line)) => {
                consecutive_errors = 0;
                line
            }
            Ok(Frame::EndOfStream) => {
                info!(target: TRANSPORT_TARGET, "input stream closed");
                break;
            }
            Err(error) => {
                consecutive_errors += 1;
                warn!(
                    target: TRANSPORT_TARGET,
                    %error,
                    consecutive_errors,
                    "failed to read request line"
                );
                if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    warn!(target: TRANSPORT_TARGET, "giving up on unreadable input stream");
                    break;
                }
                continue;
            }
        };

        if Request::is_blank(&line) {
            continue;
        }

        match Request::parse(&line) {
            Ok(request) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    ticket = %request.ticket(),
                    command = request.command(),
                    "accepted request"
                );
                match pool.submit(request) {
                    Ok(()) => stats.accepted += 1,
                    Err(request) => {
                        stats.rejected += 1;
                        dispatcher.fail(
                            request.ticket(),
                            &DispatchError::internal("no dispatch worker available"),
                        );
                    }
                }
            }
            Err(rejected) => {
                stats.rejected += 1;
                dispatcher.reject(&rejected);
            }
        }
    }

    stats
}
