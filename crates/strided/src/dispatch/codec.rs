//! JSONL framing for commands and responses.
//!
//! Every client line is one [`Command`]. Every server line is a
//! [`DaemonMessage`]: either the response to a command or an `error` report
//! for a line that could not be decoded. A bad line never ends the session.

use std::io::{BufRead, Read, Write};

use serde::{Deserialize, Serialize};
use stride_protocol::{Command, Response};

use super::errors::DispatchError;

/// Maximum size of a single command line in bytes.
///
/// Inline scenarios travel inside `SendFile` commands, hence the generous
/// limit.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Messages sent to clients, one per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaemonMessage {
    /// Answer to exactly one command.
    Response(Response),
    /// A line that could not be turned into a command.
    Error { message: String },
}

impl DaemonMessage {
    pub fn error(error: &DispatchError) -> Self {
        Self::Error {
            message: error.to_string(),
        }
    }
}

/// Decodes one command line. Trailing whitespace, including the newline,
/// is ignored.
///
/// # Errors
///
/// Returns [`DispatchError::MalformedJsonl`] for empty lines and for JSON that
/// does not match the command schema.
pub fn decode_command(line: &[u8]) -> Result<Command, DispatchError> {
    let trimmed = trim_trailing_whitespace(line);
    if trimmed.is_empty() {
        return Err(DispatchError::malformed("empty request line"));
    }
    serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
}

pub(crate) fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn trim_trailing_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |position| position + 1);
    line.get(..end).unwrap_or_default()
}

/// Reads bounded lines from a buffered stream.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the next line, or `None` at end of stream.
    ///
    /// An oversized line is consumed up to its newline and reported as
    /// [`DispatchError::RequestTooLarge`], leaving the reader positioned at
    /// the following line.
    ///
    /// # Errors
    ///
    /// Returns IO errors from the underlying stream and oversize errors.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>, DispatchError> {
        let mut buffer = Vec::new();
        let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
        let read = (&mut self.inner).take(limit).read_until(b'\n', &mut buffer)?;
        if read == 0 {
            return Ok(None);
        }
        if buffer.len() > MAX_REQUEST_BYTES && buffer.last() != Some(&b'\n') {
            let skipped = self.inner.skip_until(b'\n')?;
            return Err(DispatchError::RequestTooLarge {
                size: buffer.len() + skipped,
                max_size: MAX_REQUEST_BYTES,
            });
        }
        Ok(Some(buffer))
    }
}

/// Writes [`DaemonMessage`]s as JSONL, flushing after each line.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_message(&mut self, message: &DaemonMessage) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_response(&mut self, response: Response) -> Result<(), DispatchError> {
        self.write_message(&DaemonMessage::Response(response))
    }

    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_message(&DaemonMessage::error(error))
    }
}
