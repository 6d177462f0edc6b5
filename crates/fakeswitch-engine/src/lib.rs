//! Command-processing engine for emulated network devices.
//!
//! This crate holds the parts every emulated device shares, independent of
//! the vendor protocol spoken over the terminal:
//!
//! - **Keys**: decoding of a raw byte stream into key presses
//! - **Terminal**: per-session output queue with optional output piping
//! - **Processor**: the per-session state machine routing each line to a
//!   sub-processor, a pending continuation or a registered handler
//! - **Session**: the processor chain plus terminal of one connection, and
//!   the line-editing shell in front of it
//! - **Switch core**: the seam a device model implements to launch sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use fakeswitch_engine::{Processor, Registry, ShellSession, Terminal};
//!
//! let processor = Processor::new(MyProtocol::default(), my_registry());
//! let mut session = ShellSession::new(Box::new(processor), Terminal::default());
//! let still_open = session.receive("show version");
//! let output = session.terminal().take_output();
//! ```

mod error;
mod keys;
mod piping;
mod processor;
mod session;
mod switch_core;
mod terminal;

pub use error::*;
pub use keys::*;
pub use piping::*;
pub use processor::*;
pub use session::*;
pub use switch_core::*;
pub use terminal::*;
