use core::convert::Infallible;
use std::string::String;
use std::vec::Vec;

use crate::config::{Config, ConfigBuilder};
use crate::console::Console;
use crate::engine::Engine;
use crate::input::{Action, ControlCharacter, Parser};
use crate::processor::Env;
use crate::session::Session;
use crate::stats::Stats;
use crate::storage::{MemoryStorage, OpenMode, Storage};

pub mod csi {
    pub const LEFT: &str = "\x1b[D";
    pub const RIGHT: &str = "\x1b[C";
}

/// Minimal VT100 screen fed with everything the device writes
pub struct Screen {
    parser: Parser,
    rows: Vec<Vec<u8>>,
    row: usize,
    column: usize,
    saved: Option<(usize, usize)>,
    output: Vec<u8>,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            rows: vec![Vec::new()],
            row: 0,
            column: 0,
            saved: None,
            output: Vec::new(),
        }
    }

    /// Row under the cursor, trailing blanks removed
    pub fn line(&self) -> String {
        let row = &self.rows[self.row];
        let end = row
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |i| i + 1);

        String::from_utf8_lossy(&row[..end]).into_owned()
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Every byte received so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    fn put(&mut self, byte: u8) {
        let column = self.column;
        let row = &mut self.rows[self.row];

        if row.len() <= column {
            row.resize(column + 1, b' ');
        }

        row[column] = byte;
        self.column += 1;
    }

    fn advance(&mut self, byte: u8) {
        self.output.push(byte);

        match self.parser.advance(byte) {
            Action::Ignore => (),
            Action::Print(b) => self.put(b),
            Action::ControlCharacter(c) => match c {
                ControlCharacter::CarriageReturn => self.column = 0,
                ControlCharacter::LineFeed => {
                    self.row += 1;
                    if self.rows.len() == self.row {
                        self.rows.push(Vec::new());
                    }
                }
                ControlCharacter::CtrlH => self.column = self.column.saturating_sub(1),
                _ => (),
            },
            Action::ControlSequence(seq) => {
                let count = seq.count() as usize;

                match seq.command {
                    b'C' => self.column += count,
                    b'D' => self.column = self.column.saturating_sub(count),
                    b's' => self.saved = Some((self.row, self.column)),
                    b'u' => {
                        let (row, column) = self.saved.take().unwrap();
                        self.row = row;
                        self.column = column;
                    }
                    b'J' => {
                        self.rows = vec![Vec::new()];
                        self.row = 0;
                        self.column = 0;
                    }
                    b'H' => {
                        self.row = 0;
                        self.column = 0;
                    }
                    _ => (),
                }
            }
        }
    }
}

impl embedded_io::ErrorType for Screen {
    type Error = Infallible;
}

impl embedded_io::Write for Screen {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.advance(byte);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Engine stand-in that records what it was given
#[derive(Default)]
pub struct RecordingEngine {
    pub runs: Vec<(String, Vec<u8>)>,
    pub evals: Vec<String>,
    pub fail: bool,
    failed: bool,
}

impl RecordingEngine {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Engine for RecordingEngine {
    fn run(&mut self, name: &str, source: &[u8], _console: &mut dyn Console) {
        self.runs.push((String::from(name), source.to_vec()));
        self.failed = self.fail;
    }

    fn eval(&mut self, source: &str, console: &mut dyn Console) {
        self.evals.push(String::from(source));
        console.println(source);
        self.failed = self.fail;
    }

    fn take_error(&mut self) -> bool {
        core::mem::take(&mut self.failed)
    }
}

/// Collaborators for driving a processor without a worker
pub struct Rig {
    pub screen: Screen,
    pub storage: MemoryStorage<4, 1024>,
    pub engine: RecordingEngine,
    pub session: Session,
    pub stats: Stats,
    pub config: Config,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(ConfigBuilder::new().build())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            screen: Screen::new(),
            storage: MemoryStorage::new(),
            engine: RecordingEngine::default(),
            session: Session::new(&config),
            stats: Stats::new(),
            config,
        }
    }

    pub fn env(&mut self) -> Env<'_> {
        Env {
            console: &mut self.screen,
            storage: &mut self.storage,
            engine: &mut self.engine,
            session: &mut self.session,
            stats: &self.stats,
        }
    }

    pub fn store(&mut self, name: &str, body: &[u8]) {
        let handle = self.storage.open(name, OpenMode::Write).unwrap();
        self.storage.write(handle, body).unwrap();
        self.storage.close(handle);
    }

    pub fn read(&mut self, name: &str) -> Option<Vec<u8>> {
        let handle = self.storage.open(name, OpenMode::Read)?;
        let mut buf = vec![0; self.storage.size(handle).unwrap()];
        let n = self.storage.read(handle, &mut buf).unwrap();
        self.storage.close(handle);
        buf.truncate(n);
        Some(buf)
    }
}

/// Encode one Intel HEX record with a correct checksum
pub fn record(kind: u8, address: u16, data: &[u8]) -> String {
    let mut bytes = vec![data.len() as u8, (address >> 8) as u8, address as u8, kind];
    bytes.extend_from_slice(data);

    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    bytes.push(sum.wrapping_neg());

    let mut line = String::from(":");
    for b in bytes {
        line.push_str(&format!("{:02X}", b));
    }
    line.push_str("\r\n");
    line
}

/// Data records for `body`, 16 bytes each, followed by end of file
pub fn hex_file(body: &[u8]) -> String {
    let mut out = String::new();

    for (i, chunk) in body.chunks(16).enumerate() {
        out.push_str(&record(0x00, (i * 16) as u16, chunk));
    }

    out.push_str(&record(0x01, 0, &[]));
    out
}
