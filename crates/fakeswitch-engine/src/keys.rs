//! Keystroke decoding for terminal transports.
//!
//! Clients connected to an emulated device send a raw byte stream. Most bytes
//! are plain characters, but navigation keys arrive as ANSI escape sequences
//! (`ESC [ A` for the up arrow, `ESC [ 3 ~` for delete, ...). The decoder
//! accumulates bytes and yields one [`Key`] at a time, keeping incomplete
//! sequences buffered until the rest arrives.

use bytes::{Buf, BytesMut};

/// Escape byte that starts a control sequence.
pub const ESC: u8 = 0x1b;

/// End-of-transmission (Ctrl+D).
pub const EOT: u8 = 0x04;

/// Longest escape sequence we wait for before giving up on it.
const MAX_SEQUENCE_LENGTH: usize = 8;

/// A single decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A character, already decoded from UTF-8.
    Char(char),
    /// Backspace (`0x7f` or `0x08`).
    Backspace,
    /// Horizontal tab.
    Tab,
    /// Carriage return.
    Enter,
    /// Line feed.
    LineFeed,
    /// Ctrl+D.
    EndOfTransmission,
    /// Cursor up.
    Up,
    /// Cursor down.
    Down,
    /// Cursor left.
    Left,
    /// Cursor right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Insert.
    Insert,
    /// Delete (forward).
    Delete,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Any other control byte.
    Control(u8),
    /// An escape sequence or byte run we do not understand.
    Unknown,
}

impl Key {
    /// Whether this is one of the cursor-movement/editing keys that
    /// terminals emit as escape sequences.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::Up
                | Key::Down
                | Key::Left
                | Key::Right
                | Key::Home
                | Key::End
                | Key::Insert
                | Key::Delete
                | Key::PageUp
                | Key::PageDown
        )
    }
}

/// Byte-stream to [`Key`] decoder.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    /// Bytes received but not yet decoded.
    buffer: BytesMut,
}

impl KeyDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        KeyDecoder {
            buffer: BytesMut::with_capacity(64),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next key from the buffer.
    ///
    /// Returns `None` when the buffer is empty or only holds the beginning of
    /// a multi-byte sequence.
    pub fn decode(&mut self) -> Option<Key> {
        let first = *self.buffer.first()?;

        match first {
            ESC => self.decode_escape(),
            0x7f | 0x08 => self.consume(1, Key::Backspace),
            b'\t' => self.consume(1, Key::Tab),
            b'\r' => self.consume(1, Key::Enter),
            b'\n' => self.consume(1, Key::LineFeed),
            EOT => self.consume(1, Key::EndOfTransmission),
            0x00..=0x1f => self.consume(1, Key::Control(first)),
            0x20..=0x7e => self.consume(1, Key::Char(first as char)),
            _ => self.decode_utf8(first),
        }
    }

    /// Drain every complete key currently buffered.
    pub fn decode_all(&mut self) -> Vec<Key> {
        let mut keys = Vec::new();
        while let Some(key) = self.decode() {
            keys.push(key);
        }
        keys
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn consume(&mut self, len: usize, key: Key) -> Option<Key> {
        self.buffer.advance(len);
        Some(key)
    }

    fn decode_escape(&mut self) -> Option<Key> {
        let introducer = *self.buffer.get(1)?;

        match introducer {
            b'[' => self.decode_csi(),
            b'O' => {
                let third = *self.buffer.get(2)?;
                if third.is_ascii_control() {
                    return self.consume(2, Key::Unknown);
                }
                let key = match third {
                    b'A' => Key::Up,
                    b'B' => Key::Down,
                    b'C' => Key::Right,
                    b'D' => Key::Left,
                    b'H' => Key::Home,
                    b'F' => Key::End,
                    _ => Key::Unknown,
                };
                self.consume(3, key)
            }
            // A lone escape followed by an ordinary or control byte
            _ => self.consume(1, Key::Control(ESC)),
        }
    }

    /// Decode `ESC [ ...` sequences.
    fn decode_csi(&mut self) -> Option<Key> {
        let third = *self.buffer.get(2)?;
        if third.is_ascii_control() {
            return self.consume(2, Key::Unknown);
        }
        let key = match third {
            b'A' => Some(Key::Up),
            b'B' => Some(Key::Down),
            b'C' => Some(Key::Right),
            b'D' => Some(Key::Left),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            _ => None,
        };
        if let Some(key) = key {
            return self.consume(3, key);
        }

        // Parameterised form: ESC [ <digits> ~ (or a final letter)
        let terminator = self.buffer[2..]
            .iter()
            .position(|b| !(b.is_ascii_digit() || *b == b';'));
        let Some(offset) = terminator else {
            if self.buffer.len() >= MAX_SEQUENCE_LENGTH {
                let len = self.buffer.len();
                return self.consume(len, Key::Unknown);
            }
            return None;
        };

        let end = 2 + offset;
        // A control byte cuts the sequence short and is decoded on its own
        if self.buffer[end].is_ascii_control() {
            return self.consume(end, Key::Unknown);
        }
        let params = String::from_utf8_lossy(&self.buffer[2..end]).to_string();
        let key = if self.buffer[end] == b'~' {
            match params.split(';').next().unwrap_or("") {
                "1" | "7" => Key::Home,
                "2" => Key::Insert,
                "3" => Key::Delete,
                "4" | "8" => Key::End,
                "5" => Key::PageUp,
                "6" => Key::PageDown,
                _ => Key::Unknown,
            }
        } else {
            Key::Unknown
        };
        self.consume(end + 1, key)
    }

    fn decode_utf8(&mut self, first: u8) -> Option<Key> {
        let width = match first {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return self.consume(1, Key::Unknown),
        };
        if self.buffer.len() < width {
            return None;
        }

        match std::str::from_utf8(&self.buffer[..width])
            .ok()
            .and_then(|s| s.chars().next())
        {
            Some(c) => self.consume(width, Key::Char(c)),
            None => self.consume(1, Key::Unknown),
        }
    }
}
