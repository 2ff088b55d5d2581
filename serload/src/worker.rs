//! Worker side of the pipeline.
//!
//! The worker owns the session and the bound processor. It takes filled
//! buffers off the transfer queue in order, feeds them to the processor
//! and gives every buffer back to the pool once it has been fed, whatever
//! the processor made of it.

use alloc::boxed::Box;

use log::{debug, error, info, warn};

use crate::config::{Config, MAX_LINE};
use crate::console::Console;
use crate::decoder::RecordDecoder;
use crate::engine::Engine;
use crate::pool::Recycler;
use crate::processor::{Env, ProcessorState, StreamProcessor};
use crate::queue::Receiver;
use crate::session::{Mode, Session};
use crate::shell::Shell;
use crate::stats::Stats;
use crate::storage::Storage;

/// Collaborators the worker lends to the processor
pub struct Io<'e> {
    pub console: &'e mut dyn Console,
    pub storage: &'e mut dyn Storage,
    pub engine: &'e mut dyn Engine,
}

fn bind(mode: Mode, config: &Config) -> Box<dyn StreamProcessor> {
    match mode {
        Mode::Shell => Box::new(Shell::<MAX_LINE>::new()),
        Mode::Upload => Box::new(RecordDecoder::new(config)),
    }
}

/// Processor lifecycle, independent of where the bytes come from
struct Driver {
    config: Config,
    processor: Box<dyn StreamProcessor>,
    bound: Mode,
    state: ProcessorState,
    processed: usize,
}

impl Driver {
    fn new(config: Config) -> Self {
        Self {
            processor: bind(Mode::Shell, &config),
            config,
            bound: Mode::Shell,
            state: ProcessorState::Idle,
            processed: 0,
        }
    }

    fn set_state(&mut self, state: ProcessorState, stats: &Stats) {
        self.state = state;
        stats.set_processor_state(state);
    }

    fn rebind(&mut self, mode: Mode) {
        if mode != self.bound {
            info!("binding {:?} processor", mode);
            self.processor = bind(mode, &self.config);
            self.bound = mode;
        }
    }

    /// Init the processor the session asks for. A failed init is reported
    /// and retried once, since reporting may switch the session back to
    /// the shell.
    fn start(&mut self, env: &mut Env<'_>) {
        for _ in 0..2 {
            self.rebind(env.session.mode());

            let target = env.session.filename.clone();

            match self.processor.init(&target, env) {
                Ok(()) => {
                    debug!("{} ready", self.processor.name());
                    self.set_state(ProcessorState::Initialized, env.stats);
                    return;
                }
                Err(err) => {
                    warn!("{} init failed: {}", self.processor.name(), err);
                    self.set_state(ProcessorState::Errored, env.stats);
                    self.processor.error(err, env);
                }
            }
        }

        error!("no processor could be started");
        self.set_state(ProcessorState::Idle, env.stats);
    }

    fn finish(&mut self, env: &mut Env<'_>) {
        self.set_state(ProcessorState::Finished, env.stats);

        if let Err(err) = self.processor.close(env) {
            warn!("{} close failed: {}", self.processor.name(), err);
            self.set_state(ProcessorState::Errored, env.stats);
            self.processor.error(err, env);
        }

        self.set_state(ProcessorState::Idle, env.stats);
        self.start(env);
    }

    fn ensure_started(&mut self, env: &mut Env<'_>) {
        if self.state == ProcessorState::Idle {
            self.start(env);
        }
    }

    fn resync(&mut self, env: &mut Env<'_>) {
        if self.state != ProcessorState::Idle {
            debug!("{} resync after idle gap", self.processor.name());
            self.processor.resync(env);
        }
    }

    fn feed(&mut self, bytes: &[u8], env: &mut Env<'_>) {
        let mut rest = bytes;

        while !rest.is_empty() {
            self.ensure_started(env);

            if self.state == ProcessorState::Idle {
                error!("dropping {} bytes, nothing bound", rest.len());
                return;
            }

            let used = self.processor.process(rest, env).min(rest.len());

            self.set_state(ProcessorState::Active, env.stats);
            self.processed += used;
            env.stats.add_processed(used);
            rest = &rest[used..];

            if self.processor.is_done() {
                self.finish(env);
            } else if !rest.is_empty() {
                warn!("{} left {} bytes unread", self.processor.name(), rest.len());
                return;
            }
        }
    }
}

pub struct Worker<'a, const N: usize, const Q: usize> {
    receiver: Receiver<'a, N, Q>,
    recycler: Recycler<'a, N>,
    stats: &'a Stats,
    session: Session,
    driver: Driver,
}

impl<'a, const N: usize, const Q: usize> Worker<'a, N, Q> {
    pub fn new(
        receiver: Receiver<'a, N, Q>,
        recycler: Recycler<'a, N>,
        stats: &'a Stats,
        config: Config,
    ) -> Self {
        Self {
            receiver,
            recycler,
            stats,
            session: Session::new(&config),
            driver: Driver::new(config),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ProcessorState {
        self.driver.state
    }

    /// Bytes handed to processors so far
    pub fn processed(&self) -> usize {
        self.driver.processed
    }

    /// Handle everything queued without blocking. Returns the number of
    /// buffers consumed.
    pub fn poll(&mut self, io: &mut Io<'_>) -> usize {
        let mut env = Env {
            console: &mut *io.console,
            storage: &mut *io.storage,
            engine: &mut *io.engine,
            session: &mut self.session,
            stats: self.stats,
        };

        self.driver.ensure_started(&mut env);

        let mut handled = 0;

        while let Some(buffer) = self.receiver.recv() {
            if buffer.follows_gap() {
                self.driver.resync(&mut env);
            }

            self.driver.feed(buffer.as_slice(), &mut env);
            self.recycler.release(buffer);
            handled += 1;
        }

        handled
    }

    /// Serve forever. `wait` blocks until the intake signals new data and
    /// returns false to stop the loop.
    pub fn run(&mut self, io: &mut Io<'_>, mut wait: impl FnMut() -> bool) {
        while self.poll(io) > 0 || wait() {}

        info!("worker stopped after {} bytes", self.driver.processed);
    }
}
