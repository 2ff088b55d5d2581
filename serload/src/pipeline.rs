//! Storage for the pool and the transfer queue, split into the intake and
//! worker halves.
//!
//! # Example
//! ```
//! use serload::config::Config;
//! use serload::pipeline::Pipeline;
//! use serload::stats::Stats;
//!
//! let stats = Stats::new();
//! let config = Config::default();
//! let mut pipeline: Pipeline = Pipeline::new();
//!
//! let (mut intake, worker) = pipeline.split(&stats, &config, || ());
//!
//! let mut input = b"at\r".iter().copied();
//! let taken = intake
//!     .on_interrupt(|| input.next().ok_or(nb::Error::<core::convert::Infallible>::WouldBlock))
//!     .unwrap();
//!
//! assert_eq!(taken, 3);
//! assert_eq!(worker.session().mode(), serload::session::Mode::Shell);
//! ```

use crate::config::{Config, LINE_SIZE, QUEUE_DEPTH};
use crate::intake::Intake;
use crate::pool::BufferPool;
use crate::queue::TransferQueue;
use crate::stats::Stats;
use crate::worker::Worker;

pub struct Pipeline<const N: usize = LINE_SIZE, const Q: usize = QUEUE_DEPTH> {
    pool: BufferPool<N>,
    queue: TransferQueue<N, Q>,
}

impl<const N: usize, const Q: usize> Pipeline<N, Q> {
    pub const fn new() -> Self {
        Self {
            pool: BufferPool::new(),
            queue: TransferQueue::new(),
        }
    }

    /// `wake` is called by the intake after every enqueue and should
    /// unblock whatever drives [`Worker::run`] or [`Worker::poll`].
    pub fn split<'a, W: FnMut()>(
        &'a mut self,
        stats: &'a Stats,
        config: &Config,
        wake: W,
    ) -> (Intake<'a, W, N, Q>, Worker<'a, N, Q>) {
        let (acquirer, recycler) = self.pool.split(stats, config.recycle_cap);
        let (sender, receiver) = self.queue.split();

        (
            Intake::new(acquirer, sender, stats, config, wake),
            Worker::new(receiver, recycler, stats, config.clone()),
        )
    }
}

impl<const N: usize, const Q: usize> Default for Pipeline<N, Q> {
    fn default() -> Self {
        Self::new()
    }
}
