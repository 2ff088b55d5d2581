//! Transmit side of the serial transport
use core::fmt;

use embedded_io::Error as _;
use log::warn;

use crate::error::Error;

/// Blocking byte sink used for echo, prompts and status messages
pub trait Console {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Write and log on failure. Console output is best effort.
    fn echo(&mut self, bytes: &[u8]) {
        if let Err(err) = self.write_bytes(bytes) {
            warn!("console write failed: {}", err);
        }
    }

    fn print(&mut self, text: &str) {
        self.echo(text.as_bytes());
    }

    fn println(&mut self, text: &str) {
        self.print(text);
        self.print("\r\n");
    }

    fn write_byte(&mut self, byte: u8) {
        self.echo(&[byte]);
    }

    fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        let mut adapter = Adapter { console: self };

        if fmt::write(&mut adapter, args).is_err() {
            warn!("console write failed");
        }
    }
}

struct Adapter<'a, C: Console + ?Sized> {
    console: &'a mut C,
}

impl<C: Console + ?Sized> fmt::Write for Adapter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.write_bytes(s.as_bytes()).or(Err(fmt::Error))
    }
}

impl<T: embedded_io::Write> Console for T {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.write_all(bytes)
            .map_err(|e| Error::WriteError(e.kind()))?;
        self.flush().map_err(|e| Error::WriteError(e.kind()))
    }
}

#[cfg(feature = "std")]
pub mod std_sync {
    use std::io::Write;

    /// Wrapper for std::io::stdout
    pub struct StdoutWrapper(std::io::Stdout);

    impl StdoutWrapper {
        pub fn new() -> Self {
            Self(std::io::stdout())
        }
    }

    impl Default for StdoutWrapper {
        fn default() -> Self {
            Self::new()
        }
    }

    impl embedded_io::ErrorType for StdoutWrapper {
        type Error = embedded_io::ErrorKind;
    }

    impl embedded_io::Write for StdoutWrapper {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.write(buf).map_err(|e| e.kind().into())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.0.flush().map_err(|e| e.kind().into())
        }
    }
}
