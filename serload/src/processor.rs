//! The contract between the worker loop and whatever consumes the stream.
//!
//! The worker calls [`StreamProcessor::init`] once per session, feeds
//! bytes through [`StreamProcessor::process`] until
//! [`StreamProcessor::is_done`], then calls [`StreamProcessor::close`]
//! exactly once. A failing `init` or `close` is reported through
//! [`StreamProcessor::error`] before the next `init`. An idle gap in the
//! stream is announced with [`StreamProcessor::resync`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::console::Console;
use crate::engine::Engine;
use crate::error::Error;
use crate::session::Session;
use crate::stats::Stats;
use crate::storage::Storage;

/// Lifecycle of the bound processor, as seen by the worker
#[derive(Debug, Eq, PartialEq, Copy, Clone, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ProcessorState {
    Idle = 0,
    Initialized = 1,
    Active = 2,
    Finished = 3,
    Errored = 4,
}

/// Everything a processor may touch while it runs
pub struct Env<'e> {
    pub console: &'e mut dyn Console,
    pub storage: &'e mut dyn Storage,
    pub engine: &'e mut dyn Engine,
    pub session: &'e mut Session,
    pub stats: &'e Stats,
}

impl<'e> Env<'e> {
    /// Reborrow for a shorter scope
    pub fn reborrow(&mut self) -> Env<'_> {
        Env {
            console: &mut *self.console,
            storage: &mut *self.storage,
            engine: &mut *self.engine,
            session: &mut *self.session,
            stats: self.stats,
        }
    }
}

pub trait StreamProcessor {
    /// Start a session on `target`
    fn init(&mut self, target: &str, env: &mut Env<'_>) -> Result<(), Error>;

    /// Consume a prefix of `bytes` and return its length. Returning less
    /// than `bytes.len()` leaves the rest for the next bound processor.
    fn process(&mut self, bytes: &[u8], env: &mut Env<'_>) -> usize;

    fn is_done(&self) -> bool;

    /// Finish the session
    fn close(&mut self, env: &mut Env<'_>) -> Result<(), Error>;

    /// Told about a failed `init` or `close`
    fn error(&mut self, _error: Error, _env: &mut Env<'_>) {}

    /// The line was idle long enough that the next bytes do not continue
    /// the previous ones. Half-parsed input should be dropped.
    fn resync(&mut self, _env: &mut Env<'_>) {}

    /// Short label for the status report
    fn name(&self) -> &'static str;
}
