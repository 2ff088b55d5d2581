//! Single-line terminal editor.
//!
//! The line is `cursor` bytes before the cursor followed by `tail` bytes
//! after it. Inserts and deletes shift the tail in place and redraw it
//! between a cursor save and restore, so the terminal cursor never has to
//! be recomputed.

use log::{trace, warn};

use crate::console::Console;
use crate::input::{Action, ControlCharacter, Parser};

const CURSOR_SAVE: &str = "\x1b[s";
const CURSOR_RESTORE: &str = "\x1b[u";
const CURSOR_FORWARD: &str = "\x1b[1C";
const CURSOR_BACKWARD: &str = "\x1b[1D";

/// What a byte meant to the caller
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Key {
    /// Handled by the editor
    None,
    /// Carriage return, the line is ready
    Line,
    /// Control character the editor does not handle itself
    Control(ControlCharacter),
}

pub struct LineEditor<const CAP: usize> {
    buf: [u8; CAP],
    cursor: usize,
    tail: usize,
    parser: Parser,
}

impl<const CAP: usize> LineEditor<CAP> {
    pub fn new() -> Self {
        Self {
            buf: [0; CAP],
            cursor: 0,
            tail: 0,
            parser: Parser::new(),
        }
    }

    pub fn advance(&mut self, byte: u8, console: &mut dyn Console) -> Key {
        match self.parser.advance(byte) {
            Action::Ignore => Key::None,
            Action::Print(byte) => {
                self.insert(byte, console);
                Key::None
            }
            Action::ControlSequence(seq) => {
                let count = seq.count() as usize;

                match seq.command {
                    b'C' => self.forward(count, console),
                    b'D' => self.backward(count, console),
                    command => trace!("ignored sequence {:?}", command as char),
                }

                Key::None
            }
            Action::ControlCharacter(c) => match c {
                ControlCharacter::Backspace | ControlCharacter::CtrlH => {
                    self.delete_backward(console);
                    Key::None
                }
                ControlCharacter::CarriageReturn => {
                    console.print("\r\n");
                    Key::Line
                }
                ControlCharacter::Tab => {
                    console.write_byte(b'\t');
                    Key::None
                }
                ControlCharacter::LineFeed => Key::None,
                c => Key::Control(c),
            },
        }
    }

    /// Current line content
    pub fn line(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Current line as text. Only printable ASCII is ever stored.
    pub fn line_str(&self) -> &str {
        core::str::from_utf8(self.line()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cursor + self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.cursor = 0;
        self.tail = 0;
    }

    fn insert(&mut self, byte: u8, console: &mut dyn Console) {
        let len = self.len();

        if len >= CAP {
            warn!("line full, dropping {:#04x}", byte);
            return;
        }

        let cursor = self.cursor;

        self.buf.copy_within(cursor..len, cursor + 1);
        self.buf[cursor] = byte;
        self.cursor += 1;

        console.write_byte(byte);

        if self.tail > 0 {
            console.print(CURSOR_SAVE);
            console.echo(&self.buf[self.cursor..self.cursor + self.tail]);
            console.print(CURSOR_RESTORE);
        }
    }

    fn delete_backward(&mut self, console: &mut dyn Console) {
        if self.cursor == 0 {
            return;
        }

        let len = self.len();

        self.cursor -= 1;
        self.buf.copy_within(self.cursor + 1..len, self.cursor);
        self.buf[len - 1] = 0;

        console.write_byte(b'\x08');

        if self.tail == 0 {
            console.print(" \x08");
            return;
        }

        console.print(CURSOR_SAVE);
        console.echo(&self.buf[self.cursor..self.cursor + self.tail]);
        console.write_byte(b' ');
        console.print(CURSOR_RESTORE);
    }

    fn forward(&mut self, count: usize, console: &mut dyn Console) {
        if count > self.tail {
            return;
        }

        self.tail -= count;
        self.cursor += count;

        for _ in 0..count {
            console.print(CURSOR_FORWARD);
        }
    }

    fn backward(&mut self, count: usize, console: &mut dyn Console) {
        if count > self.cursor {
            return;
        }

        self.cursor -= count;
        self.tail += count;

        for _ in 0..count {
            console.print(CURSOR_BACKWARD);
        }
    }
}

impl<const CAP: usize> Default for LineEditor<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testlib::{csi, Screen};

    fn type_in<const CAP: usize>(
        editor: &mut LineEditor<CAP>,
        screen: &mut Screen,
        input: &str,
    ) -> Key {
        let mut key = Key::None;

        for byte in input.bytes() {
            key = editor.advance(byte, screen);
        }

        key
    }

    #[test]
    fn insert_in_the_middle() {
        let mut editor = LineEditor::<32>::new();
        let mut screen = Screen::new();

        type_in(&mut editor, &mut screen, "abc");
        type_in(&mut editor, &mut screen, csi::LEFT);
        type_in(&mut editor, &mut screen, "X");

        assert_eq!(editor.line(), b"abXc");
        assert_eq!((editor.cursor(), editor.tail()), (3, 1));
        assert_eq!(screen.line(), "abXc");
        assert_eq!(screen.column(), 3);
    }

    #[test]
    fn delete_shifts_tail_left() {
        let mut editor = LineEditor::<32>::new();
        let mut screen = Screen::new();

        type_in(&mut editor, &mut screen, "hello");
        type_in(&mut editor, &mut screen, "\x1b[2D");
        type_in(&mut editor, &mut screen, "\x7f\x08");

        assert_eq!(editor.line(), b"hlo");
        assert_eq!(screen.line(), "hlo");
        assert_eq!(screen.column(), 1);

        type_in(&mut editor, &mut screen, "\x1b[2C\x7f");
        assert_eq!(editor.line(), b"hl");
        assert_eq!(screen.line(), "hl");
    }

    #[test]
    fn oversize_moves_are_ignored() {
        let mut editor = LineEditor::<32>::new();
        let mut screen = Screen::new();

        type_in(&mut editor, &mut screen, "ab\x1b[5D");
        assert_eq!(editor.cursor(), 2);

        type_in(&mut editor, &mut screen, "\x1b[1C");
        assert_eq!(editor.cursor(), 2);

        type_in(&mut editor, &mut screen, "\x1b[2D\x1b[3C");
        assert_eq!((editor.cursor(), editor.tail()), (0, 2));
        assert_eq!(screen.column(), 0);
    }

    #[test]
    fn capacity_drops_bytes() {
        let mut editor = LineEditor::<4>::new();
        let mut screen = Screen::new();

        type_in(&mut editor, &mut screen, "abcdef");

        assert_eq!(editor.line(), b"abcd");
        assert_eq!(screen.line(), "abcd");
    }

    #[test]
    fn tab_echoed_not_stored() {
        let mut editor = LineEditor::<8>::new();
        let mut screen = Screen::new();

        type_in(&mut editor, &mut screen, "a\tb\n");

        assert_eq!(editor.line(), b"ab");
        assert_eq!(screen.output(), b"a\tb");
    }

    #[test]
    fn carriage_return_ends_line() {
        let mut editor = LineEditor::<8>::new();
        let mut screen = Screen::new();

        assert_eq!(type_in(&mut editor, &mut screen, "ls\r"), Key::Line);
        assert_eq!(editor.line_str(), "ls");
        assert!(screen.output().ends_with(b"\r\n"));

        editor.clear();
        assert!(editor.is_empty());

        assert_eq!(
            type_in(&mut editor, &mut screen, "\x18"),
            Key::Control(ControlCharacter::CtrlX)
        );
    }
}
