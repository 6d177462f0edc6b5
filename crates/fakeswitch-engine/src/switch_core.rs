//! Per-model device cores.
//!
//! A switch core knows how to start a session for its device: which
//! processor to build and which keystroke adapter the requested shell
//! variant uses.

use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::session::Shell;

/// Flavour of interactive shell requested by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellVariant {
    /// Plain line editing, Enter submits.
    #[default]
    Cli,
    /// TL1 terminal behaviour (upper-casing, `;` submits, TID injection).
    Tl1,
}

impl ShellVariant {
    /// Name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellVariant::Cli => "cli",
            ShellVariant::Tl1 => "tl1",
        }
    }
}

impl fmt::Display for ShellVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellVariant {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" | "line" => Ok(ShellVariant::Cli),
            "tl1" => Ok(ShellVariant::Tl1),
            _ => Err(EngineError::UnknownVariant(s.to_string())),
        }
    }
}

/// An emulated device able to serve sessions.
pub trait SwitchCore: Send + Sync {
    /// Name of the emulated node.
    fn node_name(&self) -> &str;

    /// Start a new session with the requested shell.
    fn launch(&self, variant: ShellVariant) -> EngineResult<Box<dyn Shell>>;
}
