//! Per-session terminal output.
//!
//! Processors never touch the transport. They queue [`TerminalOp`]s on the
//! session's [`Terminal`] and the connection task replays them in order,
//! which lets a handler ask for a pause (device latency) without blocking
//! anything but its own connection.

use std::time::Duration;

use tracing::trace;

use crate::piping::{PipeFilter, Piping};

/// Cursor one column back.
pub const CURSOR_BACKWARD: &str = "\x1b[D";

/// Delete the character under the cursor.
pub const DELETE_CHARACTER: &str = "\x1b[P";

/// Line terminator written to clients.
pub const NEWLINE: &str = "\r\n";

/// One queued terminal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOp {
    /// Send text to the client.
    Write(String),
    /// Wait before replaying the following operations.
    Pause(Duration),
    /// Drop the connection.
    Close,
}

/// Output side of a session, with its pipe filter.
pub struct Terminal {
    ops: Vec<TerminalOp>,
    piping: Box<dyn Piping>,
    closed: bool,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("ops", &self.ops)
            .field("piping", &self.piping.is_listening())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Terminal::new(Box::new(PipeFilter::new()))
    }
}

impl Terminal {
    /// Create a terminal using the given pipe filter.
    pub fn new(piping: Box<dyn Piping>) -> Self {
        Terminal {
            ops: Vec::new(),
            piping,
            closed: false,
        }
    }

    /// Write command output, passing it through the pipe filter if one is
    /// active.
    pub fn write(&mut self, data: &str) {
        if self.piping.is_listening() {
            if let Some(filtered) = self.piping.pipe(data) {
                self.write_raw(&filtered);
            }
        } else {
            self.write_raw(data);
        }
    }

    /// Write command output followed by a newline.
    pub fn write_line(&mut self, data: &str) {
        self.write(&format!("{}{}", data, NEWLINE));
    }

    /// Write directly to the client, bypassing the pipe filter (echo,
    /// cursor control).
    pub fn write_raw(&mut self, data: &str) {
        if self.closed || data.is_empty() {
            return;
        }
        trace!("write: {:?}", data);
        if let Some(TerminalOp::Write(last)) = self.ops.last_mut() {
            last.push_str(data);
        } else {
            self.ops.push(TerminalOp::Write(data.to_string()));
        }
    }

    /// Move the cursor one column back.
    pub fn cursor_backward(&mut self) {
        self.write_raw(CURSOR_BACKWARD);
    }

    /// Delete the character under the cursor.
    pub fn delete_character(&mut self) {
        self.write_raw(DELETE_CHARACTER);
    }

    /// Move to the beginning of the next line.
    pub fn next_line(&mut self) {
        self.write_raw(NEWLINE);
    }

    /// Hold back the following output for `duration`.
    pub fn pause(&mut self, duration: Duration) {
        if self.closed || duration.is_zero() {
            return;
        }
        trace!("pause: {:?}", duration);
        self.ops.push(TerminalOp::Pause(duration));
    }

    /// Close the connection once queued output has been sent.
    pub fn lose_connection(&mut self) {
        if !self.closed {
            trace!("close requested");
            self.ops.push(TerminalOp::Close);
            self.closed = true;
        }
    }

    /// Whether a close has been requested.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Activate the pipe filter. Returns `false` if the command is refused.
    pub fn start_piping(&mut self, command: &str) -> bool {
        self.piping.start_listening(command)
    }

    /// Whether a pipe filter is active.
    pub fn is_piping(&self) -> bool {
        self.piping.is_listening()
    }

    /// Close the pipe filter, flushing any output it held back.
    pub fn finish_piping(&mut self) {
        if self.piping.is_listening() {
            if let Some(rest) = self.piping.stop_listening() {
                self.write_raw(&rest);
            }
        }
    }

    /// Take all queued operations.
    pub fn take_ops(&mut self) -> Vec<TerminalOp> {
        std::mem::take(&mut self.ops)
    }

    /// Take the queued output as text, dropping pauses. Mostly useful in
    /// tests.
    pub fn take_output(&mut self) -> String {
        self.take_ops()
            .into_iter()
            .filter_map(|op| match op {
                TerminalOp::Write(data) => Some(data),
                _ => None,
            })
            .collect()
    }
}
