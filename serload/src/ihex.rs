//! Resumable Intel HEX record reader.
//!
//! Bytes are fed one at a time, so a record may be split across any
//! number of calls. A `:` always starts a fresh record, abandoning one
//! that was still open.

use log::{debug, trace};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Byte count, two address bytes, type, up to 255 data bytes, checksum
const MAX_RECORD: usize = 1 + 2 + 1 + 255 + 1;

#[derive(Debug, Eq, PartialEq, Copy, Clone, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x00,
    EndOfFile = 0x01,
    ExtendedSegmentAddress = 0x02,
    StartSegmentAddress = 0x03,
    ExtendedLinearAddress = 0x04,
    StartLinearAddress = 0x05,
}

/// A decoded record. `address` already includes the extended offsets.
#[derive(Debug, Eq, PartialEq)]
pub struct Record<'a> {
    pub kind: RecordType,
    pub address: u32,
    pub data: &'a [u8],
}

#[derive(Debug, Eq, PartialEq)]
pub enum Event<'a> {
    /// Nothing complete yet
    Pending,
    Record(Record<'a>),
    ChecksumError,
    /// Bad digit, truncated record, unknown type or bad extended address
    Malformed,
}

pub struct RecordReader {
    bytes: [u8; MAX_RECORD],
    len: usize,
    high: Option<u8>,
    open: bool,
    segment: u32,
    linear: u32,
}

impl RecordReader {
    pub fn new() -> Self {
        Self {
            bytes: [0; MAX_RECORD],
            len: 0,
            high: None,
            open: false,
            segment: 0,
            linear: 0,
        }
    }

    /// Forget everything, including extended address offsets
    pub fn reset(&mut self) {
        self.len = 0;
        self.high = None;
        self.open = false;
        self.segment = 0;
        self.linear = 0;
    }

    /// Drop a record in progress, keeping the extended address offsets.
    /// Returns whether there was one.
    pub fn abandon(&mut self) -> bool {
        let open = self.open;

        self.len = 0;
        self.high = None;
        self.open = false;

        open
    }

    /// True between a `:` and the end of its record
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn advance(&mut self, byte: u8) -> Event<'_> {
        if byte == b':' {
            if self.open && (self.len > 0 || self.high.is_some()) {
                debug!("resync, abandoning {} decoded bytes", self.len);
            }

            trace!("<MK>");
            self.begin_record();
            return Event::Pending;
        }

        if !self.open {
            return Event::Pending;
        }

        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                // A terminator here means the record was cut short
                debug!("unexpected {:#04x} inside record", byte);
                self.open = false;
                return Event::Malformed;
            }
        };

        let Some(high) = self.high.take() else {
            self.high = Some(nibble);
            return Event::Pending;
        };

        if self.len == MAX_RECORD {
            self.open = false;
            return Event::Malformed;
        }

        self.bytes[self.len] = (high << 4) | nibble;
        self.len += 1;

        if self.len < 5 || self.len < 5 + usize::from(self.bytes[0]) {
            return Event::Pending;
        }

        self.open = false;
        self.complete()
    }

    fn begin_record(&mut self) {
        self.len = 0;
        self.high = None;
        self.open = true;
    }

    fn complete(&mut self) -> Event<'_> {
        let sum = self.bytes[..self.len]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b));

        if sum != 0 {
            return Event::ChecksumError;
        }

        let count = usize::from(self.bytes[0]);
        let offset = u16::from_be_bytes([self.bytes[1], self.bytes[2]]);

        let Ok(kind) = RecordType::try_from(self.bytes[3]) else {
            debug!("unknown record type {:#04x}", self.bytes[3]);
            return Event::Malformed;
        };

        let data = &self.bytes[4..4 + count];

        match kind {
            RecordType::ExtendedSegmentAddress | RecordType::ExtendedLinearAddress => {
                let [hi, lo] = data else {
                    return Event::Malformed;
                };
                let value = u32::from(u16::from_be_bytes([*hi, *lo]));

                if kind == RecordType::ExtendedSegmentAddress {
                    self.segment = value << 4;
                } else {
                    self.linear = value << 16;
                }
            }
            _ => (),
        }

        let address = self
            .linear
            .wrapping_add(self.segment)
            .wrapping_add(u32::from(offset));

        Event::Record(Record {
            kind,
            address,
            data,
        })
    }
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testlib::record;
    use std::vec::Vec;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Record(RecordType, u32, Vec<u8>),
        Checksum,
        Malformed,
    }

    fn feed(reader: &mut RecordReader, input: &str) -> Vec<Seen> {
        let mut seen = Vec::new();

        for byte in input.bytes() {
            match reader.advance(byte) {
                Event::Pending => (),
                Event::Record(r) => {
                    seen.push(Seen::Record(r.kind, r.address, r.data.to_vec()))
                }
                Event::ChecksumError => seen.push(Seen::Checksum),
                Event::Malformed => seen.push(Seen::Malformed),
            }
        }

        seen
    }

    #[test]
    fn data_and_eof() {
        let mut reader = RecordReader::new();

        let seen = feed(&mut reader, ":0B0010006164647265737320676170A7\r\n:00000001FF\r\n");

        assert_eq!(
            seen,
            [
                Seen::Record(RecordType::Data, 0x10, b"address gap".to_vec()),
                Seen::Record(RecordType::EndOfFile, 0, Vec::new()),
            ]
        );
    }

    #[test]
    fn extended_addresses() {
        let mut reader = RecordReader::new();

        let input = [
            record(0x02, 0, &[0x12, 0x00]),
            record(0x00, 0x0004, b"ab"),
            record(0x04, 0, &[0x00, 0x01]),
            record(0x00, 0x0002, b"cd"),
        ]
        .concat();

        let seen = feed(&mut reader, &input);

        assert_eq!(seen[1], Seen::Record(RecordType::Data, 0x12004, b"ab".to_vec()));
        assert_eq!(seen[3], Seen::Record(RecordType::Data, 0x22002, b"cd".to_vec()));
    }

    #[test]
    fn bit_flip_fails_checksum() {
        let mut reader = RecordReader::new();

        assert_eq!(
            feed(&mut reader, ":0100000041BE\r\n"),
            [Seen::Record(RecordType::Data, 0, b"A".to_vec())]
        );
        assert_eq!(feed(&mut reader, ":0100000043BE\r\n"), [Seen::Checksum]);
    }

    #[test]
    fn malformed_records() {
        let mut reader = RecordReader::new();

        assert_eq!(feed(&mut reader, ":01000000\r\n"), [Seen::Malformed]);
        assert_eq!(feed(&mut reader, ":0100G0"), [Seen::Malformed]);
        assert_eq!(feed(&mut reader, &record(0x07, 0, &[])), [Seen::Malformed]);
        assert_eq!(feed(&mut reader, &record(0x04, 0, &[1])), [Seen::Malformed]);
    }

    #[test]
    fn marker_resyncs() {
        let mut reader = RecordReader::new();

        let input = [":0300", record(0x00, 0, b"x").as_str()].concat();

        assert_eq!(
            feed(&mut reader, &input),
            [Seen::Record(RecordType::Data, 0, b"x".to_vec())]
        );
        assert!(!reader.is_open());
    }

    #[test]
    fn abandoned_record_is_not_completed() {
        let mut reader = RecordReader::new();

        assert!(feed(&mut reader, ":010000").is_empty());
        assert!(reader.abandon());
        assert!(!reader.abandon());

        assert!(feed(&mut reader, "0041BE\r\n").is_empty());
        assert_eq!(
            feed(&mut reader, ":0100000041BE\r\n"),
            [Seen::Record(RecordType::Data, 0, b"A".to_vec())]
        );
    }

    #[test]
    fn noise_outside_records_is_ignored() {
        let mut reader = RecordReader::new();

        assert!(feed(&mut reader, "hello\r\n").is_empty());
    }
}
