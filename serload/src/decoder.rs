//! Stream processor that writes an Intel HEX upload into storage and runs
//! it once the end-of-file record arrives.

use embedded_io::SeekFrom;
use log::{debug, info, warn};

use crate::config::Config;
use crate::engine::run_artifact;
use crate::error::Error;
use crate::ihex::{Event, Record, RecordReader, RecordType};
use crate::processor::{Env, StreamProcessor};
use crate::session::{parse_name, Name};
use crate::storage::{Handle, OpenMode};

const CTRL_C: u8 = 0x03;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum Status {
    Start,
    InProgress,
    Finished,
    Aborted,
    Errored(Error),
}

pub struct RecordDecoder {
    reader: RecordReader,
    status: Status,
    handle: Option<Handle>,
    name: Name,
    echo: bool,
    base: u32,
    written: usize,
}

impl RecordDecoder {
    pub fn new(config: &Config) -> Self {
        Self {
            reader: RecordReader::new(),
            status: Status::Start,
            handle: None,
            name: Name::new(),
            echo: config.echo,
            base: config.base_address,
            written: 0,
        }
    }

    /// Payload bytes written in this session
    pub fn written(&self) -> usize {
        self.written
    }
}

fn store(
    record: Record<'_>,
    base: u32,
    handle: Option<Handle>,
    env: &mut Env<'_>,
) -> Result<usize, Error> {
    let handle = handle.ok_or(Error::StorageOpen)?;
    let address = base.wrapping_add(record.address);

    debug!("{:#x}: {} bytes", address, record.data.len());

    env.storage.seek(handle, SeekFrom::Start(u64::from(address)))?;
    let count = env.storage.write(handle, record.data)?;

    if count < record.data.len() {
        warn!("record at {:#x} clipped to {} bytes", address, count);
    }

    Ok(count)
}

impl StreamProcessor for RecordDecoder {
    fn init(&mut self, target: &str, env: &mut Env<'_>) -> Result<(), Error> {
        self.reader.reset();
        self.status = Status::Start;
        self.written = 0;
        self.name = parse_name(target)?;

        env.console.println("[RDY]");

        match env.storage.open(target, OpenMode::Write) {
            Some(handle) => {
                self.handle = Some(handle);
                info!("receiving {}", target);
                Ok(())
            }
            None => {
                self.status = Status::Errored(Error::StorageOpen);
                Err(Error::StorageOpen)
            }
        }
    }

    fn process(&mut self, bytes: &[u8], env: &mut Env<'_>) -> usize {
        let Self {
            reader,
            status,
            handle,
            echo,
            base,
            written,
            ..
        } = self;

        for (i, &byte) in bytes.iter().enumerate() {
            let ended = matches!(status, Status::Finished | Status::Aborted | Status::Errored(_));

            // The ending record's line terminator is ours, the rest is not
            if ended && byte != b'\r' && byte != b'\n' {
                return i;
            }

            if *echo {
                env.console.write_byte(byte);
            }

            if ended {
                continue;
            }

            if byte == CTRL_C && !reader.is_open() {
                *status = Status::Aborted;
                continue;
            }

            match reader.advance(byte) {
                Event::Pending => (),
                Event::Record(record) => match record.kind {
                    RecordType::Data => match store(record, *base, *handle, env) {
                        Ok(count) => {
                            *written += count;
                            *status = Status::InProgress;
                        }
                        Err(err) => {
                            warn!("storing record failed: {}", err);
                            *status = Status::Errored(err);
                        }
                    },
                    RecordType::EndOfFile => *status = Status::Finished,
                    kind => debug!("{:?} record", kind),
                },
                Event::ChecksumError => {
                    warn!("checksum error after {} bytes", written);
                    env.console.println("[ERR] Checksum error");
                    *status = Status::Errored(Error::Checksum);
                }
                Event::Malformed => {
                    warn!("malformed record after {} bytes", written);
                    env.console.println("[ERR] Malformed record");
                    *status = Status::Errored(Error::Malformed);
                }
            }
        }

        bytes.len()
    }

    fn is_done(&self) -> bool {
        matches!(
            self.status,
            Status::Finished | Status::Aborted | Status::Errored(_)
        )
    }

    fn close(&mut self, env: &mut Env<'_>) -> Result<(), Error> {
        if let Some(handle) = self.handle.take() {
            env.storage.close(handle);
        }

        match self.status {
            Status::Finished => (),
            Status::Aborted => {
                env.storage.remove(&self.name);
                env.console.println("[ABORT]");
                env.session.end_upload();
                return Ok(());
            }
            Status::Errored(err) => return Err(err),
            Status::Start | Status::InProgress => return Err(Error::Incomplete),
        }

        env.console.println("[EOF]");
        info!("{} received, {} bytes", self.name, self.written);

        if let Err(err) = run_artifact(&self.name, env.storage, env.engine, env.console) {
            env.console.print_fmt(format_args!("[ERR] {}\r\n", err));
        }

        env.console.println("[CLOSE]");
        env.session.end_upload();

        Ok(())
    }

    fn error(&mut self, error: Error, env: &mut Env<'_>) {
        env.console.println("[Download Error]");

        if !error.is_protocol() {
            // Retrying cannot fix a missing or full storage
            env.console.print_fmt(format_args!("[ERR] {}\r\n", error));
            env.session.end_upload();
        }
    }

    fn resync(&mut self, _env: &mut Env<'_>) {
        if self.reader.abandon() {
            warn!("record cut by idle gap, {} bytes written so far", self.written);
        }
    }

    fn name(&self) -> &'static str {
        "ihex"
    }
}
