//! Shell sessions and keystroke adapters.
//!
//! A [`ShellSession`] owns the processor chain and the terminal of one
//! connection. A [`Shell`] sits in front of it and turns key presses into
//! lines; [`LineShell`] is the plain "type a line, press Enter" adapter,
//! protocol specific adapters live with their protocol.

use tracing::{debug, info, trace};

use crate::keys::Key;
use crate::processor::CommandProcessor;
use crate::terminal::Terminal;

/// One connected client: the processor chain plus its terminal.
pub struct ShellSession {
    processor: Box<dyn CommandProcessor>,
    terminal: Terminal,
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("processor", &self.processor.name())
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl ShellSession {
    /// Start a session, showing the first prompt.
    pub fn new(mut processor: Box<dyn CommandProcessor>, mut terminal: Terminal) -> Self {
        processor.show_prompt(&mut terminal);
        ShellSession {
            processor,
            terminal,
        }
    }

    /// Process a complete line. Returns whether the session is still
    /// listening; `false` means the connection should be closed.
    pub fn receive(&mut self, line: &str) -> bool {
        debug!("received: {:?}", line);
        let processed = self.processor.process_command(line, &mut self.terminal);
        if !processed {
            info!("Command not supported : {}", line);
            self.terminal.finish_piping();
            self.processor.handle_unknown_command(line, &mut self.terminal);
            self.processor.show_prompt(&mut self.terminal);
        }
        !self.processor.is_done()
    }

    /// Whether the processor chain waits for a single key press.
    pub fn awaiting_keystroke(&self) -> bool {
        self.processor.awaiting_keystroke()
    }

    /// Deliver a key press to a waiting processor.
    pub fn receive_keystroke(&mut self, key: Key) -> bool {
        self.processor.keystroke(key, &mut self.terminal)
    }

    /// Whether the top processor has finished.
    pub fn is_done(&self) -> bool {
        self.processor.is_done()
    }

    /// The session's terminal.
    pub fn terminal(&mut self) -> &mut Terminal {
        &mut self.terminal
    }
}

/// Keystroke-level front end of a session.
pub trait Shell: Send {
    /// Handle one key press.
    fn key_received(&mut self, key: Key);

    /// Terminal holding the output produced so far.
    fn terminal(&mut self) -> &mut Terminal;

    /// Handle a batch of key presses, stopping once the connection is closed.
    fn keys_received(&mut self, keys: Vec<Key>) {
        for key in keys {
            if self.terminal().is_closed() {
                break;
            }
            self.key_received(key);
        }
    }
}

/// Line editing shell: echoes characters and submits on Enter.
#[derive(Debug)]
pub struct LineShell {
    session: ShellSession,
    buffer: String,
    /// The previous key was a carriage return, so a following line feed is
    /// part of the same Enter.
    after_cr: bool,
}

impl LineShell {
    /// Wrap a session.
    pub fn new(session: ShellSession) -> Self {
        LineShell {
            session,
            buffer: String::new(),
            after_cr: false,
        }
    }

    /// The wrapped session.
    pub fn session(&mut self) -> &mut ShellSession {
        &mut self.session
    }

    fn line_received(&mut self) {
        let line = std::mem::take(&mut self.buffer);
        self.session.terminal().next_line();
        if !self.session.receive(&line) {
            self.session.terminal().lose_connection();
        }
    }
}

impl Shell for LineShell {
    fn key_received(&mut self, key: Key) {
        let after_cr = std::mem::replace(&mut self.after_cr, key == Key::Enter);

        if key == Key::EndOfTransmission {
            self.session.terminal().lose_connection();
            return;
        }

        if self.session.awaiting_keystroke() {
            self.session.receive_keystroke(key);
            return;
        }

        match key {
            Key::Char(c) => {
                self.buffer.push(c);
                self.session.terminal().write_raw(c.encode_utf8(&mut [0; 4]));
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    let terminal = self.session.terminal();
                    terminal.cursor_backward();
                    terminal.delete_character();
                }
            }
            Key::Enter => self.line_received(),
            Key::LineFeed if after_cr => {}
            Key::LineFeed => self.line_received(),
            other => trace!("ignoring key {:?}", other),
        }
    }

    fn terminal(&mut self) -> &mut Terminal {
        self.session.terminal()
    }
}
