//! TL1 terminal behaviour.
//!
//! A TL1 craft terminal is not a line editor:
//!
//! - `;` ends the command, Enter and Tab do nothing
//! - navigation keys are ignored, Ctrl-D drops the connection
//! - unquoted characters are upper-cased
//! - the password block of `ACT-USER` is not echoed
//! - typing `VERB::` fills in the node's TID

use fakeswitch_engine::{Key, Shell, ShellSession, Terminal};
use tracing::{trace, warn};

/// Keystroke adapter in front of a TL1 session.
#[derive(Debug)]
pub struct Tl1Shell {
    session: ShellSession,
    /// TID as injected, quoted unless the node name is upper case.
    tid: String,
    /// Typed characters; an injected TID is kept as one chunk so that it is
    /// erased as a whole.
    buffer: Vec<String>,
    quoted: bool,
}

impl Tl1Shell {
    pub fn new(session: ShellSession, node_name: &str) -> Self {
        Tl1Shell {
            session,
            tid: tid_for(node_name),
            buffer: Vec::new(),
            quoted: false,
        }
    }

    /// TID written when the user leaves it empty.
    pub fn tid(&self) -> &str {
        &self.tid
    }

    /// The wrapped session.
    pub fn session(&mut self) -> &mut ShellSession {
        &mut self.session
    }

    /// Current command text.
    pub fn line(&self) -> String {
        self.buffer.concat()
    }

    /// Echo is off while typing the password block:
    /// `ACT-USER:TID:USER:CTAG::<password>`.
    fn is_echo_off(&self) -> bool {
        let line = self.line();
        let line = line.trim_matches(' ');
        line.len() > 7 && line.starts_with("ACT-USER") && line.matches(':').count() == 5
    }

    fn colon_count(&self) -> usize {
        self.buffer.iter().filter(|chunk| chunk.as_str() == ":").count()
    }

    /// The TID block is still empty after the verb's colon.
    fn tid_is_empty(&self) -> bool {
        let line = self.line();
        line.trim_matches(' ')
            .split(':')
            .nth(1)
            .is_some_and(str::is_empty)
    }

    fn handle_backspace(&mut self) {
        let Some(last) = self.buffer.last() else {
            return;
        };
        if last == "\"" {
            self.quoted = !self.quoted;
        }

        if !self.is_echo_off() {
            let width = last.chars().count();
            let terminal = self.session.terminal();
            for _ in 0..width {
                terminal.cursor_backward();
                terminal.delete_character();
            }
        }

        self.buffer.pop();
    }

    fn handle_semicolon(&mut self) {
        let terminal = self.session.terminal();
        terminal.write_raw(";");
        terminal.next_line();

        let line = std::mem::take(&mut self.buffer).concat();
        self.line_received(&line);
    }

    fn character_received(&mut self, c: char) {
        if c == '"' {
            self.quoted = !self.quoted;
        }
        let c = if self.quoted { c } else { c.to_ascii_uppercase() };

        if c == ':' && self.colon_count() == 1 && self.tid_is_empty() {
            let tid = self.tid.clone();
            self.session.terminal().write_raw(&tid);
            self.buffer.push(tid);
        }

        if !self.is_echo_off() {
            self.session.terminal().write_raw(c.encode_utf8(&mut [0; 4]));
        }
        self.buffer.push(c.to_string());
    }

    fn line_received(&mut self, line: &str) {
        if !self.session.receive(line) {
            self.session.terminal().lose_connection();
        }
    }
}

impl Shell for Tl1Shell {
    fn key_received(&mut self, key: Key) {
        if key == Key::EndOfTransmission {
            self.session.terminal().lose_connection();
            return;
        }

        if self.session.awaiting_keystroke() {
            self.session.receive_keystroke(key);
            return;
        }

        match key {
            Key::Backspace => self.handle_backspace(),
            Key::Char(';') => self.handle_semicolon(),
            Key::Tab | Key::Enter | Key::LineFeed => {}
            Key::Char(c) if is_printable(c) => self.character_received(c),
            key if key.is_navigation() => trace!("ignoring {:?}", key),
            key => warn!("Received unhandled key: {:?}", key),
        }
    }

    fn terminal(&mut self) -> &mut Terminal {
        self.session.terminal()
    }
}

/// The node name is used as is when all its letters are upper case,
/// otherwise it has to be quoted.
pub fn tid_for(node_name: &str) -> String {
    let has_cased = node_name.chars().any(char::is_alphabetic);
    let all_upper = !node_name.chars().any(char::is_lowercase);
    if has_cased && all_upper {
        node_name.to_string()
    } else {
        format!("\"{}\"", node_name)
    }
}

fn is_printable(c: char) -> bool {
    c.is_ascii_graphic() || c == ' '
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use fakeswitch_engine::TerminalOp;
    use fakeswitch_model::SwitchConfiguration;

    use crate::processor::{new_processor, Tl1Options};

    fn shell(node_name: &str) -> Tl1Shell {
        let config = Arc::new(SwitchConfiguration::empty(node_name));
        let options = Tl1Options {
            login_delay: Duration::ZERO,
            seed: Some(3),
        };
        let processor = new_processor(config, &options, 1);
        let session = ShellSession::new(Box::new(processor), Terminal::default());
        let mut shell = Tl1Shell::new(session, node_name);
        shell.terminal().take_ops();
        shell
    }

    fn type_text(shell: &mut Tl1Shell, text: &str) {
        shell.keys_received(text.chars().map(Key::Char).collect());
    }

    #[test]
    fn test_tid_quoting() {
        assert_eq!(tid_for("NODE-1"), "NODE-1");
        assert_eq!(tid_for("eu-uk-not1-1"), "\"eu-uk-not1-1\"");
        assert_eq!(tid_for("Mixed"), "\"Mixed\"");
        assert_eq!(tid_for("1234"), "\"1234\"");
    }

    #[test]
    fn test_unquoted_input_is_upper_cased() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "rtrv-eqpt");
        assert_eq!(shell.line(), "RTRV-EQPT");
        assert_eq!(shell.terminal().take_output(), "RTRV-EQPT");
    }

    #[test]
    fn test_quoted_input_keeps_case() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "act-user:NODE:\"urban\":abc");
        assert_eq!(shell.line(), "ACT-USER:NODE:\"urban\":ABC");
    }

    #[test]
    fn test_tid_injection() {
        let mut shell = shell("eu-uk-not1-1");
        type_text(&mut shell, "rtrv-eqpt::");
        assert_eq!(shell.line(), "RTRV-EQPT:\"eu-uk-not1-1\":");
        assert_eq!(shell.terminal().take_output(), "RTRV-EQPT:\"eu-uk-not1-1\":");

    }

    #[test]
    fn test_typed_tid_is_kept() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "rtrv-eqpt:x:");
        assert_eq!(shell.line(), "RTRV-EQPT:X:");
    }

    #[test]
    fn test_backspace_erases_injected_tid_at_once() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "a::");
        shell.terminal().take_output();

        shell.key_received(Key::Backspace);
        shell.key_received(Key::Backspace);
        assert_eq!(shell.line(), "A:");
        assert_eq!(shell.terminal().take_output(), "\x1b[D\x1b[P".repeat(5));
    }

    #[test]
    fn test_backspace_toggles_quote() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "a\"");
        shell.key_received(Key::Backspace);
        type_text(&mut shell, "b");
        assert_eq!(shell.line(), "AB");

        shell.key_received(Key::Backspace);
        shell.key_received(Key::Backspace);
        shell.key_received(Key::Backspace);
        assert_eq!(shell.line(), "");
    }

    #[test]
    fn test_password_is_not_echoed() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "act-user::\"urban\":1::secret");

        let echoed = shell.terminal().take_output();
        assert_eq!(echoed, "ACT-USER:NODE:\"urban\":1::");
        assert_eq!(shell.line(), "ACT-USER:NODE:\"urban\":1::SECRET");

        // Backspace in the password block is silent too
        shell.key_received(Key::Backspace);
        assert_eq!(shell.terminal().take_output(), "");
    }

    #[test]
    fn test_semicolon_submits() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "act-user::\"urban\":1::pw;");

        let output = shell.terminal().take_output();
        assert!(output.starts_with("ACT-USER:NODE:\"urban\":1::;\r\n\r\n   \"NODE\" "));
        assert!(output.ends_with("\r\nM  1 COMPLD\r\n   /*AUTHTYPE=FAKE*/\r\n;\r\n< "));
        assert_eq!(shell.line(), "");
    }

    #[test]
    fn test_inert_keys() {
        let mut shell = shell("NODE");
        shell.keys_received(vec![
            Key::Char('a'),
            Key::Up,
            Key::Left,
            Key::Insert,
            Key::Delete,
            Key::Home,
            Key::PageDown,
            Key::Tab,
            Key::Enter,
            Key::LineFeed,
            Key::Control(0x07),
            Key::Char('é'),
        ]);
        assert_eq!(shell.line(), "A");
        assert_eq!(shell.terminal().take_output(), "A");
    }

    #[test]
    fn test_ctrl_d_closes_immediately() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "rtrv");
        shell.terminal().take_ops();

        shell.keys_received(vec![Key::EndOfTransmission, Key::Char(';')]);
        assert_eq!(shell.terminal().take_ops(), vec![TerminalOp::Close]);
    }

    #[test]
    fn test_unknown_command_gets_icnv() {
        let mut shell = shell("NODE");
        type_text(&mut shell, "act-user::u:1::pw;");
        shell.terminal().take_output();

        type_text(&mut shell, "rtrv-nothing:::2;");
        let output = shell.terminal().take_output();
        assert!(output.contains("\r\nM  0 DENY\r\n   ICNV\r\n"));
        assert!(output.ends_with(";\r\n< "));
    }
}
