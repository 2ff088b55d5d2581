//! Error types

use core::fmt;

use embedded_io::ErrorKind;

/// Enum to hold the errors raised by intake, processors and the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Transfer queue had no room for a completed buffer
    QueueFull,
    ReadError(ErrorKind),
    WriteError(ErrorKind),
    /// Storage refused to hand out a handle
    StorageOpen,
    NotFound,
    NameTooLong,
    MissingArgument,
    InvalidArgument,
    UnknownCommand,
    /// Record checksum did not add up to zero
    Checksum,
    /// Record with bad digits, bad length or unknown type
    Malformed,
    /// Session closed before the end-of-file record
    Incomplete,
    /// Stored artifact length disagrees with its text length
    SizeMismatch,
}

impl Error {
    /// Errors that end a decode session rather than a single command
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Checksum | Error::Malformed | Error::Incomplete)
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::QueueFull => ErrorKind::OutOfMemory,
            Error::ReadError(kind) | Error::WriteError(kind) => kind,
            Error::StorageOpen => ErrorKind::PermissionDenied,
            Error::NotFound => ErrorKind::NotFound,
            Error::NameTooLong | Error::MissingArgument | Error::InvalidArgument => {
                ErrorKind::InvalidInput
            }
            Error::UnknownCommand => ErrorKind::Unsupported,
            Error::Checksum | Error::Malformed | Error::SizeMismatch => ErrorKind::InvalidData,
            Error::Incomplete => ErrorKind::Interrupted,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Error::QueueFull => "Transfer queue full",
            Error::ReadError(_) => "Read error",
            Error::WriteError(_) => "Write error",
            Error::StorageOpen => "Cannot open file",
            Error::NotFound => "File not found",
            Error::NameTooLong => "Name too long",
            Error::MissingArgument => "Missing argument",
            Error::InvalidArgument => "Invalid argument",
            Error::UnknownCommand => "Unknown command",
            Error::Checksum => "Checksum error",
            Error::Malformed => "Malformed record",
            Error::Incomplete => "Transfer incomplete",
            Error::SizeMismatch => "Size mismatch",
        };

        f.write_str(message)
    }
}
