use num_enum::{IntoPrimitive, TryFromPrimitive};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Eq, PartialEq, Copy, Clone, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlCharacter {
    NUL = 0x0,
    CtrlA = 0x1,
    CtrlB = 0x2,
    CtrlC = 0x3,
    CtrlD = 0x4,
    CtrlE = 0x5,
    CtrlF = 0x6,
    CtrlG = 0x7,
    CtrlH = 0x8,
    Tab = 0x9,
    LineFeed = 0xA,
    CtrlK = 0xB,
    CtrlL = 0xC,
    CarriageReturn = 0xD,
    CtrlN = 0xE,
    CtrlO = 0xF,
    CtrlP = 0x10,
    CtrlQ = 0x11,
    CtrlR = 0x12,
    CtrlS = 0x13,
    CtrlT = 0x14,
    CtrlU = 0x15,
    CtrlV = 0x16,
    CtrlW = 0x17,
    CtrlX = 0x18,
    CtrlY = 0x19,
    CtrlZ = 0x1A,
    Escape = 0x1B,
    FS = 0x1C,
    GS = 0x1D,
    RS = 0x1E,
    US = 0x1F,
    Backspace = 0x7F,
}

/// A finished `ESC [ <first> ; <second> <command>` sequence
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct ControlSequence {
    pub command: u8,
    pub first: Option<u32>,
    pub second: Option<u32>,
}

impl ControlSequence {
    /// Repeat count of a cursor movement, 1 when omitted
    pub fn count(&self) -> u32 {
        self.first.unwrap_or(1)
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Action {
    Ignore,
    Print(u8),
    ControlCharacter(ControlCharacter),
    ControlSequence(ControlSequence),
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum State {
    Ground,
    EscapeSeen,
    AnsiFirstDigit,
    AnsiNumeric(u32),
    AnsiNumericSecond(u32, u32),
}

/// Byte-at-a-time terminal input decoder. State survives between calls,
/// so a sequence may be split anywhere.
pub struct Parser {
    state: State,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
        }
    }

    /// True while in the middle of an escape sequence
    pub fn in_sequence(&self) -> bool {
        self.state != State::Ground
    }

    pub fn advance(&mut self, byte: u8) -> Action {
        match self.state {
            State::Ground => match byte {
                0x1b => {
                    self.state = State::EscapeSeen;
                    Action::Ignore
                }
                0x20..=0x7e => Action::Print(byte),
                _ => match ControlCharacter::try_from(byte) {
                    Ok(c) => Action::ControlCharacter(c),
                    Err(_) => Action::Ignore,
                },
            },
            State::EscapeSeen => {
                // Anything but '[' ends the escape and is dropped
                self.state = if byte == b'[' {
                    State::AnsiFirstDigit
                } else {
                    State::Ground
                };
                Action::Ignore
            }
            State::AnsiFirstDigit => match byte {
                b'0'..=b'9' => {
                    self.state = State::AnsiNumeric(u32::from(byte - b'0'));
                    Action::Ignore
                }
                _ => self.finish(byte, None, None),
            },
            State::AnsiNumeric(value) => match byte {
                b'0'..=b'9' => {
                    self.state = State::AnsiNumeric(push_digit(value, byte));
                    Action::Ignore
                }
                b';' => {
                    self.state = State::AnsiNumericSecond(value, 0);
                    Action::Ignore
                }
                _ => self.finish(byte, Some(value), None),
            },
            State::AnsiNumericSecond(first, second) => match byte {
                b'0'..=b'9' => {
                    self.state = State::AnsiNumericSecond(first, push_digit(second, byte));
                    Action::Ignore
                }
                _ => self.finish(byte, Some(first), Some(second)),
            },
        }
    }

    fn finish(&mut self, command: u8, first: Option<u32>, second: Option<u32>) -> Action {
        self.state = State::Ground;

        Action::ControlSequence(ControlSequence {
            command,
            first,
            second,
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn push_digit(value: u32, digit: u8) -> u32 {
    value
        .saturating_mul(10)
        .saturating_add(u32::from(digit - b'0'))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::vec::Vec;
    use ControlCharacter::*;

    fn input_sequence(parser: &mut Parser, seq: &str) -> Vec<Action> {
        seq.bytes().map(|b| parser.advance(b)).collect()
    }

    fn last(parser: &mut Parser, seq: &str) -> Action {
        let mut actions = input_sequence(parser, seq);
        let action = actions.pop().unwrap();

        while let Some(action) = actions.pop() {
            assert_eq!(action, Action::Ignore);
        }

        action
    }

    fn csi(command: u8, first: Option<u32>, second: Option<u32>) -> Action {
        Action::ControlSequence(ControlSequence {
            command,
            first,
            second,
        })
    }

    #[test]
    fn parser() {
        let mut parser = Parser::new();

        assert_eq!(parser.state, State::Ground);

        assert_eq!(parser.advance(b'a'), Action::Print(b'a'));
        assert_eq!(parser.advance(0x7), Action::ControlCharacter(CtrlG));
        assert_eq!(parser.advance(0x3), Action::ControlCharacter(CtrlC));
        assert_eq!(parser.advance(0x7f), Action::ControlCharacter(Backspace));
        assert_eq!(parser.advance(0xc3), Action::Ignore);

        assert_eq!(last(&mut parser, "\x1b[C"), csi(b'C', None, None));
        assert_eq!(last(&mut parser, "\x1b[12D"), csi(b'D', Some(12), None));
        assert_eq!(last(&mut parser, "\x1b[312;836R"), csi(b'R', Some(312), Some(836)));
        assert_eq!(last(&mut parser, "\x1b[2;H"), csi(b'H', Some(2), Some(0)));

        assert_eq!(parser.state, State::Ground);
    }

    #[test]
    fn absent_number_counts_as_one() {
        let mut parser = Parser::new();

        match last(&mut parser, "\x1b[D") {
            Action::ControlSequence(seq) => assert_eq!(seq.count(), 1),
            action => panic!("unexpected {:?}", action),
        }
    }

    #[test]
    fn second_separator_ends_sequence() {
        let mut parser = Parser::new();

        assert_eq!(last(&mut parser, "\x1b[1;2;"), csi(b';', Some(1), Some(2)));
        assert_eq!(parser.advance(b'C'), Action::Print(b'C'));
    }

    #[test]
    fn non_bracket_escape_is_swallowed() {
        let mut parser = Parser::new();

        assert_eq!(
            input_sequence(&mut parser, "\x1bOx"),
            [Action::Ignore, Action::Ignore, Action::Print(b'x')]
        );
    }

    #[test]
    fn split_sequences_resume() {
        let mut parser = Parser::new();

        assert_eq!(parser.advance(0x1b), Action::Ignore);
        assert!(parser.in_sequence());
        assert_eq!(parser.advance(b'['), Action::Ignore);
        assert_eq!(parser.advance(b'3'), Action::Ignore);
        assert_eq!(parser.advance(b'C'), csi(b'C', Some(3), None));
        assert!(!parser.in_sequence());
    }
}
