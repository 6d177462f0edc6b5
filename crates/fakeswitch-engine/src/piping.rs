//! Output piping (`show running-config | include vlan`).
//!
//! While a pipe is active every write of the current command goes through
//! the filter. Filtering works on whole lines, so partial writes are held
//! back until their line is complete or the pipe is closed.

use regex::Regex;
use tracing::debug;

use crate::error::PipeError;

/// Output filter attached to a session.
pub trait Piping: Send {
    /// Activate the filter described by `command` (e.g. `include ge-0/0/1`).
    /// Returns `false` when the command is not understood.
    fn start_listening(&mut self, command: &str) -> bool;

    /// Whether a filter is currently active.
    fn is_listening(&self) -> bool;

    /// Filter written data. Returns what should reach the terminal, if
    /// anything.
    fn pipe(&mut self, data: &str) -> Option<String>;

    /// Close the filter, returning any held back output that passes it.
    fn stop_listening(&mut self) -> Option<String>;
}

/// Supported filter modes.
#[derive(Debug, Clone)]
pub enum PipeMode {
    /// Drop lines until one matches, then pass everything.
    Begin {
        /// Pattern that opens the output.
        pattern: Regex,
        /// Whether a matching line has been seen.
        started: bool,
    },
    /// Only pass matching lines.
    Include(Regex),
    /// Only pass lines that do not match.
    Exclude(Regex),
}

impl PipeMode {
    /// Parse a pipe command such as `begin interface` or `inc vlan`.
    ///
    /// The keyword may be abbreviated to any prefix.
    pub fn parse(command: &str) -> Result<PipeMode, PipeError> {
        let command = command.trim();
        let (keyword, pattern) = match command.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (command, ""),
        };

        if keyword.is_empty() {
            return Err(PipeError::UnknownCommand(command.to_string()));
        }
        if pattern.is_empty() {
            return Err(PipeError::MissingPattern(keyword.to_string()));
        }

        let regex = Regex::new(pattern)?;
        if "begin".starts_with(keyword) {
            Ok(PipeMode::Begin {
                pattern: regex,
                started: false,
            })
        } else if "include".starts_with(keyword) {
            Ok(PipeMode::Include(regex))
        } else if "exclude".starts_with(keyword) {
            Ok(PipeMode::Exclude(regex))
        } else {
            Err(PipeError::UnknownCommand(keyword.to_string()))
        }
    }

    /// Decide whether a single line (without its terminator) passes.
    fn accepts(&mut self, line: &str) -> bool {
        match self {
            PipeMode::Begin { pattern, started } => {
                if !*started && pattern.is_match(line) {
                    *started = true;
                }
                *started
            }
            PipeMode::Include(pattern) => pattern.is_match(line),
            PipeMode::Exclude(pattern) => !pattern.is_match(line),
        }
    }
}

/// Line-oriented filter implementing `begin`, `include` and `exclude`.
#[derive(Debug, Default)]
pub struct PipeFilter {
    mode: Option<PipeMode>,
    /// Output of an unfinished line.
    pending: String,
}

impl PipeFilter {
    /// Create an inactive filter.
    pub fn new() -> Self {
        PipeFilter::default()
    }

    fn filter_lines(&mut self, complete: &str) -> String {
        let mut out = String::new();
        let Some(mode) = self.mode.as_mut() else {
            return complete.to_string();
        };
        for line in complete.split_inclusive('\n') {
            let content = line.trim_end_matches(['\r', '\n']);
            if mode.accepts(content) {
                out.push_str(line);
            }
        }
        out
    }
}

impl Piping for PipeFilter {
    fn start_listening(&mut self, command: &str) -> bool {
        match PipeMode::parse(command) {
            Ok(mode) => {
                debug!("Piping started: {:?}", mode);
                self.mode = Some(mode);
                self.pending.clear();
                true
            }
            Err(e) => {
                debug!("Refusing pipe '{}': {}", command, e);
                false
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.mode.is_some()
    }

    fn pipe(&mut self, data: &str) -> Option<String> {
        self.pending.push_str(data);
        let split = self.pending.rfind('\n')? + 1;
        let complete: String = self.pending.drain(..split).collect();
        let out = self.filter_lines(&complete);
        (!out.is_empty()).then_some(out)
    }

    fn stop_listening(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let out = if rest.is_empty() {
            String::new()
        } else {
            self.filter_lines(&rest)
        };
        self.mode = None;
        debug!("Piping stopped");
        (!out.is_empty()).then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert!(matches!(
            PipeMode::parse("include vlan"),
            Ok(PipeMode::Include(_))
        ));
        assert!(matches!(PipeMode::parse("inc vlan"), Ok(PipeMode::Include(_))));
        assert!(matches!(PipeMode::parse("e vlan"), Ok(PipeMode::Exclude(_))));
        assert!(matches!(
            PipeMode::parse("begin interface"),
            Ok(PipeMode::Begin { started: false, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_commands() {
        assert!(matches!(
            PipeMode::parse("grep foo"),
            Err(PipeError::UnknownCommand(_))
        ));
        assert!(matches!(
            PipeMode::parse("include"),
            Err(PipeError::MissingPattern(_))
        ));
        assert!(matches!(
            PipeMode::parse("include ("),
            Err(PipeError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_include_filters_lines() {
        let mut filter = PipeFilter::new();
        assert!(filter.start_listening("include vlan"));

        let out = filter.pipe("vlan 10\r\nname foo\r\nvlan 20\r\n");
        assert_eq!(out.as_deref(), Some("vlan 10\r\nvlan 20\r\n"));
        assert!(filter.stop_listening().is_none());
        assert!(!filter.is_listening());
    }

    #[test]
    fn test_exclude_holds_partial_lines() {
        let mut filter = PipeFilter::new();
        assert!(filter.start_listening("exclude secret"));

        assert!(filter.pipe("public ").is_none());
        assert_eq!(filter.pipe("line\nsecret line\n").as_deref(), Some("public line\n"));
        assert!(filter.pipe("tail").is_none());
        assert_eq!(filter.stop_listening().as_deref(), Some("tail"));
    }

    #[test]
    fn test_begin_passes_everything_after_match() {
        let mut filter = PipeFilter::new();
        assert!(filter.start_listening("begin ^interface"));

        let out = filter.pipe("hostname sw\ninterface 1\n shutdown\nvlan 2\n");
        assert_eq!(out.as_deref(), Some("interface 1\n shutdown\nvlan 2\n"));
    }

    #[test]
    fn test_refused_pipe_stays_inactive() {
        let mut filter = PipeFilter::new();
        assert!(!filter.start_listening("count"));
        assert!(!filter.is_listening());
    }
}
