//! Interrupt-side byte intake.
//!
//! [`Intake::on_interrupt`] is called from the receive interrupt with a
//! non-blocking byte source. Bytes are appended to the open line buffer,
//! which is flushed to the transfer queue on a line terminator, when full,
//! or at the end of a burst once `flush_threshold` bytes are buffered.
//! The worker is woken after every enqueue.
//!
//! When the queue is full the buffer is parked and reading stops, leaving
//! the remaining bytes in the transport until the next interrupt or
//! [`Intake::tick`].
//!
//! After `idle_timeout` ticks of silence a partial buffer is dropped and
//! the next buffer is marked with [`LineBuffer::follows_gap`], so the
//! worker can tell its processor that the stream was interrupted.

use alloc::boxed::Box;

use embedded_io::Error as _;
use log::{debug, trace, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::config::Config;
use crate::error::Error;
use crate::line_buffer::LineBuffer;
use crate::pool::Acquirer;
use crate::queue::Sender;
use crate::stats::Stats;

/// Last thing the intake did, published for the status report
#[derive(Debug, Eq, PartialEq, Copy, Clone, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum IntakeState {
    Init = 0,
    RxReady = 1,
    Filling = 2,
    Flushed = 3,
    Overflow = 4,
    IdleReset = 5,
    ReadError = 6,
}

pub struct Intake<'a, W: FnMut(), const N: usize, const Q: usize> {
    acquirer: Acquirer<'a, N>,
    sender: Sender<'a, N, Q>,
    open: Option<Box<LineBuffer<N>>>,
    pending: Option<Box<LineBuffer<N>>>,
    wake: W,
    stats: &'a Stats,
    flush_threshold: usize,
    idle_timeout: u32,
    idle_ticks: u32,
    /// Bytes arrived since the last idle reset
    active: bool,
    /// The next buffer opened follows an idle reset
    gap: bool,
}

impl<'a, W: FnMut(), const N: usize, const Q: usize> Intake<'a, W, N, Q> {
    pub fn new(
        acquirer: Acquirer<'a, N>,
        sender: Sender<'a, N, Q>,
        stats: &'a Stats,
        config: &Config,
        wake: W,
    ) -> Self {
        Self {
            acquirer,
            sender,
            open: None,
            pending: None,
            wake,
            stats,
            flush_threshold: config.flush_threshold.max(1),
            idle_timeout: config.idle_timeout,
            idle_ticks: 0,
            active: false,
            gap: false,
        }
    }

    /// Drain `rx` until it would block. Returns the number of bytes taken.
    pub fn on_interrupt<E: embedded_io::Error>(
        &mut self,
        mut rx: impl FnMut() -> nb::Result<u8, E>,
    ) -> Result<usize, Error> {
        self.stats.set_intake_state(IntakeState::RxReady);

        if let Some(buffer) = self.pending.take() {
            self.send(buffer)?;
        }

        let mut count = 0;

        loop {
            let byte = match rx() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(err)) => {
                    self.stats.add_received(count);
                    self.stats.set_intake_state(IntakeState::ReadError);
                    warn!("transport read failed: {:?}", err.kind());
                    return Err(Error::ReadError(err.kind()));
                }
            };

            count += 1;
            self.idle_ticks = 0;
            self.active = true;

            let buffer = self.open.get_or_insert_with(|| {
                let mut buffer = self.acquirer.acquire();

                if core::mem::take(&mut self.gap) {
                    buffer.mark_gap();
                }

                buffer
            });

            // A full buffer is flushed right away, so there is always room here
            let pushed = buffer.push(byte);
            debug_assert!(pushed.is_ok(), "open buffer was left full");

            if byte == b'\r' || byte == b'\n' || buffer.is_full() {
                trace!("flush on {:#04x}", byte);
                if let Err(err) = self.flush() {
                    self.stats.add_received(count);
                    return Err(err);
                }
            } else {
                self.stats.set_intake_state(IntakeState::Filling);
            }
        }

        self.stats.add_received(count);

        let buffered = self.open.as_ref().map_or(0, |buffer| buffer.len());

        if buffered >= self.flush_threshold {
            self.flush()?;
        }

        Ok(count)
    }

    /// Periodic timer hook, same context as the receive interrupt
    pub fn tick(&mut self) {
        if let Some(buffer) = self.pending.take() {
            if self.send(buffer).is_err() {
                return;
            }
        }

        if self.idle_timeout == 0 {
            return;
        }

        self.idle_ticks = self.idle_ticks.saturating_add(1);

        if self.idle_ticks < self.idle_timeout {
            return;
        }

        self.idle_ticks = 0;

        if !core::mem::take(&mut self.active) {
            return;
        }

        // Earlier bytes may already be queued, so the gap travels with the
        // next buffer
        match self.open.as_mut() {
            Some(buffer) => {
                if !buffer.is_empty() {
                    warn!("idle timeout, dropping {} buffered bytes", buffer.len());
                }
                buffer.clear();
                buffer.mark_gap();
            }
            None => self.gap = true,
        }

        debug!("idle timeout, stream marked discontinuous");
        self.stats.note_idle_reset();
        self.stats.set_intake_state(IntakeState::IdleReset);
    }

    /// Bytes sitting in the open buffer
    pub fn buffered(&self) -> usize {
        self.open.as_ref().map_or(0, |buffer| buffer.len())
    }

    /// True while a completed buffer waits for room in the queue
    pub fn is_stalled(&self) -> bool {
        self.pending.is_some()
    }

    fn flush(&mut self) -> Result<(), Error> {
        match self.open.take() {
            Some(buffer) if !buffer.is_empty() => self.send(buffer),
            Some(buffer) => {
                self.open = Some(buffer);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn send(&mut self, buffer: Box<LineBuffer<N>>) -> Result<(), Error> {
        let len = buffer.len();

        match self.sender.send(buffer) {
            Ok(()) => {
                debug!("queued {} bytes", len);
                self.stats.set_intake_state(IntakeState::Flushed);
                (self.wake)();
                Ok(())
            }
            Err(buffer) => {
                self.pending = Some(buffer);
                self.stats.note_overflow();
                self.stats.set_intake_state(IntakeState::Overflow);
                warn!("transfer queue full, holding {} bytes", len);
                Err(Error::QueueFull)
            }
        }
    }
}
