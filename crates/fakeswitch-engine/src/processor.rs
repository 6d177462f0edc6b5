//! Generic command processor.
//!
//! A [`Processor`] receives one logical line at a time and decides where it
//! goes:
//!
//! 1. A ` | ` suffix activates output piping for the command.
//! 2. An attached sub-processor (`configure terminal` style modes) gets the
//!    line first. When it reports done it is detached.
//! 3. A pending continuation (a question asked by the previous command)
//!    consumes the line once.
//! 4. Otherwise the [`Protocol`] parses the line and the verb is looked up in
//!    the processor's [`Registry`]. A miss is reported back as "not handled"
//!    so the session can answer with the vendor's unknown-command error.
//!
//! After a handled line the pipe is closed and the prompt shown, unless the
//! command left the processor waiting for more input.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::keys::Key;
use crate::terminal::Terminal;

/// Marker separating a command from its pipe filter.
pub const PIPE_MARKER: &str = " | ";

/// Object-safe interface of a processor in a session's delegation chain.
pub trait CommandProcessor: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Process one logical line. Returns `false` when nothing in the chain
    /// knew what to do with it.
    fn process_command(&mut self, line: &str, terminal: &mut Terminal) -> bool;

    /// Whether this processor has finished (e.g. `exit` from a sub-mode).
    fn is_done(&self) -> bool;

    /// Show the prompt of the innermost active processor.
    fn show_prompt(&mut self, terminal: &mut Terminal);

    /// Whether some processor in the chain waits for a single keystroke.
    fn awaiting_keystroke(&self) -> bool;

    /// Deliver a keystroke to the processor waiting for it. Returns `false`
    /// when nobody was waiting.
    fn keystroke(&mut self, key: Key, terminal: &mut Terminal) -> bool;

    /// Answer a line nothing in the chain could handle.
    fn handle_unknown_command(&mut self, line: &str, terminal: &mut Terminal);
}

/// Outcome of parsing a line with a [`Protocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<R, F> {
    /// Nothing to do (blank line).
    Blank,
    /// A well-formed command to dispatch on `verb`.
    Command {
        /// Registry key of the command.
        verb: String,
        /// Protocol-specific request.
        request: R,
    },
    /// The line is malformed; the protocol renders its own error.
    Fault(F),
}

/// Protocol-specific part of a [`Processor`].
pub trait Protocol: Send + Sized + 'static {
    /// Parsed command handed to handlers.
    type Request: Send;
    /// Parse failure rendered by [`Protocol::reject`].
    type Fault: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Tokenise a line.
    fn parse(&self, line: &str) -> Parsed<Self::Request, Self::Fault>;

    /// Render a parse failure.
    fn reject(processor: &mut Processor<Self>, terminal: &mut Terminal, fault: Self::Fault);

    /// Build the prompt text.
    fn prompt(&mut self) -> String;

    /// Answer a line that no handler accepted. Silent by default.
    fn unknown_command(processor: &mut Processor<Self>, terminal: &mut Terminal, line: &str) {
        let _ = (processor, terminal, line);
    }
}

/// Command handler.
pub type Handler<P> = fn(&mut Processor<P>, &mut Terminal, <P as Protocol>::Request);

/// Single-shot callback receiving the next line.
pub type Continuation<P> = Box<dyn FnOnce(&mut Processor<P>, &mut Terminal, &str) + Send>;

/// Single-shot callback receiving the next key press.
pub type KeystrokeHandler<P> = Box<dyn FnOnce(&mut Processor<P>, &mut Terminal, Key) + Send>;

/// Verb to handler table.
pub struct Registry<P: Protocol> {
    handlers: HashMap<String, Handler<P>>,
}

impl<P: Protocol> Default for Registry<P> {
    fn default() -> Self {
        Registry {
            handlers: HashMap::new(),
        }
    }
}

impl<P: Protocol> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut verbs = self.verbs();
        verbs.sort_unstable();
        f.debug_struct("Registry").field("verbs", &verbs).finish()
    }
}

impl<P: Protocol> Registry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a handler, builder style.
    pub fn with(mut self, verb: &str, handler: Handler<P>) -> Self {
        self.register(verb, handler);
        self
    }

    /// Add or replace a handler.
    pub fn register(&mut self, verb: &str, handler: Handler<P>) {
        self.handlers.insert(verb.to_string(), handler);
    }

    /// Look up the handler for `verb`.
    pub fn get(&self, verb: &str) -> Option<Handler<P>> {
        self.handlers.get(verb).copied()
    }

    /// Whether `verb` is registered.
    pub fn contains(&self, verb: &str) -> bool {
        self.handlers.contains_key(verb)
    }

    /// Registered verbs, in no particular order.
    pub fn verbs(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

/// Command processor driving a [`Protocol`].
pub struct Processor<P: Protocol> {
    protocol: P,
    registry: Registry<P>,
    sub_processor: Option<Box<dyn CommandProcessor>>,
    continuation: Option<Continuation<P>>,
    keystroke_handler: Option<KeystrokeHandler<P>>,
    done: bool,
    /// Set when the current command attached a sub-processor.
    just_moved: bool,
}

impl<P: Protocol + fmt::Debug> fmt::Debug for Processor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("protocol", &self.protocol)
            .field("registry", &self.registry)
            .field("sub_processor", &self.sub_processor.as_ref().map(|p| p.name().to_string()))
            .field("continuing", &self.continuation.is_some())
            .field("awaiting_keystroke", &self.keystroke_handler.is_some())
            .field("done", &self.done)
            .finish()
    }
}

impl<P: Protocol> Processor<P> {
    /// Create a processor with its handler table.
    pub fn new(protocol: P, registry: Registry<P>) -> Self {
        Processor {
            protocol,
            registry,
            sub_processor: None,
            continuation: None,
            keystroke_handler: None,
            done: false,
            just_moved: false,
        }
    }

    /// Protocol state.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Mutable protocol state.
    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    /// Handler table.
    pub fn registry(&self) -> &Registry<P> {
        &self.registry
    }

    /// Hand all following input to `processor` until it reports done.
    pub fn move_to(&mut self, mut processor: Box<dyn CommandProcessor>, terminal: &mut Terminal) {
        info!("new subprocessor = {}", processor.name());
        processor.show_prompt(terminal);
        self.sub_processor = Some(processor);
        self.just_moved = true;
    }

    /// Whether a sub-processor is attached.
    pub fn has_sub_processor(&self) -> bool {
        self.sub_processor.is_some()
    }

    /// Have the next line processed by `continuation` instead of the
    /// registry.
    pub fn continue_to<F>(&mut self, continuation: F)
    where
        F: FnOnce(&mut Processor<P>, &mut Terminal, &str) + Send + 'static,
    {
        self.continuation = Some(Box::new(continuation));
    }

    /// Whether a continuation is pending.
    pub fn is_continuing(&self) -> bool {
        self.continuation.is_some()
    }

    /// Have the next key press delivered to `handler` without waiting for a
    /// complete line.
    pub fn on_keystroke<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Processor<P>, &mut Terminal, Key) + Send + 'static,
    {
        self.keystroke_handler = Some(Box::new(handler));
    }

    /// Mark this processor as finished.
    pub fn set_done(&mut self) {
        self.done = true;
    }

    /// Parse `line` and run its handler.
    pub fn parse_and_execute_command(&mut self, line: &str, terminal: &mut Terminal) -> bool {
        match self.protocol.parse(line) {
            Parsed::Blank => true,
            Parsed::Fault(fault) => {
                P::reject(self, terminal, fault);
                true
            }
            Parsed::Command { verb, request } => match self.registry.get(&verb) {
                Some(handler) => {
                    debug!("{}: dispatching '{}'", self.protocol.name(), verb);
                    handler(self, terminal, request);
                    true
                }
                None => {
                    debug!(
                        "{} can't process : {}, falling back to parent",
                        self.protocol.name(),
                        line
                    );
                    false
                }
            },
        }
    }

    /// Run the pending continuation, clearing it first.
    fn continue_command(&mut self, line: &str, terminal: &mut Terminal) -> bool {
        match self.continuation.take() {
            Some(continuation) => {
                continuation(self, terminal, line);
                true
            }
            None => false,
        }
    }

    /// Run the line through the sub-processor, detaching it once done.
    fn delegate_to_sub_processor(&mut self, line: &str, terminal: &mut Terminal) -> bool {
        let Some(sub_processor) = self.sub_processor.as_mut() else {
            return false;
        };
        let processed = sub_processor.process_command(line, terminal);
        if sub_processor.is_done() {
            debug!("subprocessor {} done", sub_processor.name());
            self.sub_processor = None;
            terminal.finish_piping();
            self.show_prompt(terminal);
        }
        processed
    }

    /// Whether the last command left this processor expecting more input
    /// elsewhere, in which case no prompt is due.
    fn is_waiting(&self) -> bool {
        self.continuation.is_some() || self.keystroke_handler.is_some() || self.done || self.just_moved
    }
}

impl<P: Protocol> CommandProcessor for Processor<P> {
    fn name(&self) -> &str {
        self.protocol.name()
    }

    fn process_command(&mut self, line: &str, terminal: &mut Terminal) -> bool {
        let mut line = line;
        if let Some((command, piping_command)) = line.split_once(PIPE_MARKER) {
            if !terminal.start_piping(piping_command) {
                return false;
            }
            line = command;
        }

        self.just_moved = false;
        let mut processed = false;
        if self.sub_processor.is_some() {
            processed = self.delegate_to_sub_processor(line, terminal);
        }

        if !processed {
            processed = if self.continuation.is_some() {
                self.continue_command(line, terminal)
            } else {
                self.parse_and_execute_command(line, terminal)
            };

            if processed && !self.is_waiting() {
                terminal.finish_piping();
                self.show_prompt(terminal);
            }
        }

        processed
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn show_prompt(&mut self, terminal: &mut Terminal) {
        match self.sub_processor.as_mut() {
            Some(sub_processor) => sub_processor.show_prompt(terminal),
            None => {
                let prompt = self.protocol.prompt();
                terminal.write(&prompt);
            }
        }
    }

    fn awaiting_keystroke(&self) -> bool {
        self.keystroke_handler.is_some()
            || self
                .sub_processor
                .as_ref()
                .is_some_and(|p| p.awaiting_keystroke())
    }

    fn keystroke(&mut self, key: Key, terminal: &mut Terminal) -> bool {
        if let Some(sub_processor) = self.sub_processor.as_mut() {
            if sub_processor.awaiting_keystroke() {
                return sub_processor.keystroke(key, terminal);
            }
        }
        match self.keystroke_handler.take() {
            Some(handler) => {
                handler(self, terminal, key);
                true
            }
            None => false,
        }
    }

    fn handle_unknown_command(&mut self, line: &str, terminal: &mut Terminal) {
        P::unknown_command(self, terminal, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Space separated toy protocol: `verb arg...`.
    #[derive(Debug, Default)]
    struct Toy {
        prompt: String,
        echoed: Vec<String>,
    }

    impl Protocol for Toy {
        type Request = Vec<String>;
        type Fault = String;

        fn name(&self) -> &'static str {
            "toy"
        }

        fn parse(&self, line: &str) -> Parsed<Self::Request, Self::Fault> {
            let mut words = line.split_whitespace();
            match words.next() {
                None => Parsed::Blank,
                Some("!") => Parsed::Fault("bang".to_string()),
                Some(verb) => Parsed::Command {
                    verb: verb.to_string(),
                    request: words.map(str::to_string).collect(),
                },
            }
        }

        fn reject(_processor: &mut Processor<Self>, terminal: &mut Terminal, fault: String) {
            terminal.write_line(&format!("% {}", fault));
        }

        fn prompt(&mut self) -> String {
            format!("{}> ", self.prompt)
        }

        fn unknown_command(_processor: &mut Processor<Self>, terminal: &mut Terminal, line: &str) {
            terminal.write_line(&format!("unknown: {}", line));
        }
    }

    fn do_echo(processor: &mut Processor<Toy>, terminal: &mut Terminal, args: Vec<String>) {
        processor.protocol_mut().echoed.push(args.join(" "));
        terminal.write_line(&args.join("\n"));
    }

    fn do_ask(processor: &mut Processor<Toy>, terminal: &mut Terminal, _args: Vec<String>) {
        terminal.write("Name? ");
        processor.continue_to(|processor, terminal, answer| {
            processor.protocol_mut().echoed.push(format!("answer={}", answer));
            terminal.write_line(&format!("hello {}", answer));
        });
    }

    fn do_press(processor: &mut Processor<Toy>, terminal: &mut Terminal, _args: Vec<String>) {
        terminal.write("Press any key");
        processor.on_keystroke(|processor, terminal, key| {
            terminal.write_line(&format!(" got {:?}", key));
            processor.show_prompt(terminal);
        });
    }

    fn do_configure(processor: &mut Processor<Toy>, terminal: &mut Terminal, _args: Vec<String>) {
        let prompt = if processor.protocol().prompt == "top" {
            "config"
        } else {
            "config-if"
        };
        let sub = Processor::new(
            Toy {
                prompt: prompt.to_string(),
                ..Default::default()
            },
            Registry::new()
                .with("echo", do_echo)
                .with("configure", do_configure)
                .with("exit", do_exit),
        );
        processor.move_to(Box::new(sub), terminal);
    }

    fn do_exit(processor: &mut Processor<Toy>, _terminal: &mut Terminal, _args: Vec<String>) {
        processor.set_done();
    }

    fn toy() -> Processor<Toy> {
        Processor::new(
            Toy {
                prompt: "top".to_string(),
                ..Default::default()
            },
            Registry::new()
                .with("echo", do_echo)
                .with("ask", do_ask)
                .with("press", do_press)
                .with("configure", do_configure)
                .with("exit", do_exit),
        )
    }

    #[test]
    fn test_dispatch_and_prompt() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("echo a b", &mut terminal));
        assert_eq!(terminal.take_output(), "a\nb\r\ntop> ");
        assert_eq!(processor.protocol().echoed, vec!["a b".to_string()]);
    }

    #[test]
    fn test_unknown_verb_is_unhandled() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(!processor.process_command("frobnicate", &mut terminal));
        assert_eq!(terminal.take_output(), "");

        processor.handle_unknown_command("frobnicate", &mut terminal);
        assert_eq!(terminal.take_output(), "unknown: frobnicate\r\n");
    }

    #[test]
    fn test_blank_line_shows_prompt() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("   ", &mut terminal));
        assert_eq!(terminal.take_output(), "top> ");
    }

    #[test]
    fn test_fault_is_rendered_by_protocol() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("! x", &mut terminal));
        assert_eq!(terminal.take_output(), "% bang\r\ntop> ");
    }

    #[test]
    fn test_continuation_is_single_shot() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("ask", &mut terminal));
        assert!(processor.is_continuing());
        assert_eq!(terminal.take_output(), "Name? ");

        // The answer would be an unknown verb, the continuation takes it anyway
        assert!(processor.process_command("bob", &mut terminal));
        assert!(!processor.is_continuing());
        assert_eq!(terminal.take_output(), "hello bob\r\ntop> ");

        assert!(!processor.process_command("bob", &mut terminal));
        assert_eq!(
            processor.protocol().echoed,
            vec!["answer=bob".to_string()]
        );
    }

    #[test]
    fn test_sub_processor_receives_input_until_done() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("configure", &mut terminal));
        assert!(processor.has_sub_processor());
        assert_eq!(terminal.take_output(), "config> ");

        assert!(processor.process_command("echo x", &mut terminal));
        assert_eq!(terminal.take_output(), "x\r\nconfig> ");
        assert!(processor.protocol().echoed.is_empty());

        // Not known by the sub-processor, falls back to the parent
        assert!(processor.process_command("ask", &mut terminal));
        assert_eq!(terminal.take_output(), "Name? ");
        assert!(processor.process_command("amy", &mut terminal));
        assert_eq!(terminal.take_output(), "hello amy\r\nconfig> ");

        assert!(processor.process_command("exit", &mut terminal));
        assert!(!processor.has_sub_processor());
        assert!(!processor.is_done());
        assert_eq!(terminal.take_output(), "top> ");
    }

    #[test]
    fn test_nested_delegation() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        processor.process_command("configure", &mut terminal);
        assert!(processor.process_command("configure", &mut terminal));
        assert_eq!(terminal.take_output(), "config> config-if> ");

        // Only the innermost processor sees the input
        assert!(processor.process_command("echo deep", &mut terminal));
        assert_eq!(terminal.take_output(), "deep\r\nconfig-if> ");

        assert!(processor.process_command("exit", &mut terminal));
        assert!(processor.has_sub_processor());
        assert_eq!(terminal.take_output(), "config> ");

        assert!(processor.process_command("exit", &mut terminal));
        assert!(!processor.has_sub_processor());
        assert_eq!(terminal.take_output(), "top> ");
    }

    #[test]
    fn test_keystroke_wait_suppresses_prompt() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("press", &mut terminal));
        assert!(processor.awaiting_keystroke());
        assert_eq!(terminal.take_output(), "Press any key");

        assert!(processor.keystroke(Key::Char('q'), &mut terminal));
        assert!(!processor.awaiting_keystroke());
        assert_eq!(terminal.take_output(), " got Char('q')\r\ntop> ");

        assert!(!processor.keystroke(Key::Char('q'), &mut terminal));
    }

    #[test]
    fn test_piped_command_output_is_filtered() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("echo vlan1 eth0 vlan2 | include vlan", &mut terminal));
        assert!(!terminal.is_piping());
        assert_eq!(terminal.take_output(), "vlan1\nvlan2\r\ntop> ");
    }

    #[test]
    fn test_refused_pipe_rejects_line() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(!processor.process_command("echo a | count", &mut terminal));
        assert!(processor.protocol().echoed.is_empty());
        assert_eq!(terminal.take_output(), "");
    }

    #[test]
    fn test_done_processor_skips_prompt() {
        let mut processor = toy();
        let mut terminal = Terminal::default();

        assert!(processor.process_command("exit", &mut terminal));
        assert!(processor.is_done());
        assert_eq!(terminal.take_output(), "");
    }
}
