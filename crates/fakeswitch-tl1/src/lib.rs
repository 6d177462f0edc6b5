//! TL1 emulation of a Ciena 6500 node.
//!
//! This crate provides:
//! - **Command**: tokenising of `VERB:TID:AID:CTAG:...;` lines
//! - **Processor**: the TL1 protocol state (login, MOTD, paging) and the
//!   `ACT-USER`, `CANC-USER` and `RTRV-EQPT` handlers
//! - **Response**: headers, `DENY` envelopes and paginated listings
//! - **Shell**: the TL1 craft terminal keystroke behaviour
//! - **Core**: [`Ciena6500Core`], launching sessions for a configured node

mod ciena;
mod command;
mod entry;
mod error;
mod processor;
pub mod response;
mod shell;

pub use ciena::*;
pub use command::*;
pub use entry::*;
pub use error::*;
pub use processor::*;
pub use shell::*;
