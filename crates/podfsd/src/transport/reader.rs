//! Line framing for the request stream.

use std::io::{self, BufRead};

/// Outcome of reading one frame from the input stream.
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete line, including its delimiter when one was present.
    Line(Vec<u8>),
    /// The stream is closed.
    EndOfStream,
}

/// Reads newline-delimited frames as raw bytes.
///
/// Bytes are not validated as UTF-8 here; decoding errors belong to the
/// request parser so a bad line never stops the loop.
pub(crate) struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next frame, retrying on interrupts.
    pub(crate) fn next_frame(&mut self) -> io::Result<Frame> {
        let mut buffer = Vec::new();
        loop {
            match self.inner.read_until(b'\n', &mut buffer) {
                Ok(0) if buffer.is_empty() => return Ok(Frame::EndOfStream),
                Ok(_) => return Ok(Frame::Line(buffer)),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        }
    }
}
