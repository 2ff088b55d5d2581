//! Pieces shared by the host demos: a stand-in script engine, a byte
//! source that plays the part of the UART data register and logger setup.

use core::convert::Infallible;

use serload::console::Console;
use serload::engine::Engine;
use serload::error::Error;
use serload::intake::Intake;

/// End of transmission, quits the demos
pub const CTRL_D: u8 = 0x04;

/// Engine that prints what it would have run
#[derive(Default)]
pub struct PrintEngine {
    failed: bool,
}

impl Engine for PrintEngine {
    fn run(&mut self, name: &str, source: &[u8], console: &mut dyn Console) {
        console.print_fmt(format_args!("--- {} ({} bytes)\r\n", name, source.len()));

        for line in source.split(|&b| b == b'\n') {
            console.echo(line);
            console.print("\r\n");
        }

        self.failed = source.is_empty();
    }

    fn eval(&mut self, source: &str, console: &mut dyn Console) {
        console.print_fmt(format_args!("=> {}\r\n", source));
    }

    fn take_error(&mut self) -> bool {
        core::mem::take(&mut self.failed)
    }
}

/// Bytes of one read, handed out one at a time
pub struct Burst<'a> {
    bytes: &'a [u8],
}

impl<'a> Burst<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read(&mut self) -> nb::Result<u8, Infallible> {
        let (&first, rest) = self.bytes.split_first().ok_or(nb::Error::WouldBlock)?;
        self.bytes = rest;

        Ok(first)
    }
}

/// One receive interrupt. Returns true while the intake is waiting for
/// room in the queue and the call should be repeated.
pub fn interrupt<W: FnMut(), const N: usize, const Q: usize>(
    intake: &mut Intake<'_, W, N, Q>,
    burst: &mut Burst<'_>,
) -> bool {
    match intake.on_interrupt(|| burst.read()) {
        Ok(_) => false,
        Err(Error::QueueFull) => true,
        Err(err) => {
            log::error!("intake failed: {}", err);
            false
        }
    }
}

/// Logs go to stderr so they do not mix with the raw terminal
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}
