//! Diagnostic counters shared by the interrupt and worker contexts.
//!
//! Everything here is a relaxed atomic. The counters are read by the
//! status report and never drive control flow.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering::Relaxed};

use crate::intake::IntakeState;
use crate::processor::ProcessorState;

pub struct Stats {
    in_circulation: AtomicUsize,
    high_water: AtomicUsize,
    allocated: AtomicUsize,
    freed: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    bytes_received: AtomicUsize,
    bytes_processed: AtomicUsize,
    overflows: AtomicUsize,
    idle_resets: AtomicUsize,
    intake_state: AtomicU8,
    processor_state: AtomicU8,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            in_circulation: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            allocated: AtomicUsize::new(0),
            freed: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            bytes_received: AtomicUsize::new(0),
            bytes_processed: AtomicUsize::new(0),
            overflows: AtomicUsize::new(0),
            idle_resets: AtomicUsize::new(0),
            intake_state: AtomicU8::new(0),
            processor_state: AtomicU8::new(0),
        }
    }

    pub(crate) fn note_alloc(&self) {
        let live = self.in_circulation.fetch_add(1, Relaxed) + 1;
        self.high_water.fetch_max(live, Relaxed);
        self.allocated.fetch_add(1, Relaxed);
    }

    pub(crate) fn note_free(&self) {
        self.in_circulation.fetch_sub(1, Relaxed);
        self.freed.fetch_add(1, Relaxed);
    }

    pub(crate) fn note_acquire(&self) {
        self.acquired.fetch_add(1, Relaxed);
    }

    pub(crate) fn note_release(&self) {
        self.released.fetch_add(1, Relaxed);
    }

    pub(crate) fn add_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes, Relaxed);
    }

    pub(crate) fn add_processed(&self, bytes: usize) {
        self.bytes_processed.fetch_add(bytes, Relaxed);
    }

    pub(crate) fn note_overflow(&self) {
        self.overflows.fetch_add(1, Relaxed);
    }

    pub(crate) fn note_idle_reset(&self) {
        self.idle_resets.fetch_add(1, Relaxed);
    }

    pub(crate) fn set_intake_state(&self, state: IntakeState) {
        self.intake_state.store(state.into(), Relaxed);
    }

    pub(crate) fn set_processor_state(&self, state: ProcessorState) {
        self.processor_state.store(state.into(), Relaxed);
    }

    /// Buffers alive right now, pooled or not
    pub fn in_circulation(&self) -> usize {
        self.in_circulation.load(Relaxed)
    }

    /// Buffers handed out by the pool and not yet given back
    pub fn in_flight(&self) -> usize {
        self.acquired
            .load(Relaxed)
            .saturating_sub(self.released.load(Relaxed))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            in_circulation: self.in_circulation.load(Relaxed),
            high_water: self.high_water.load(Relaxed),
            allocated: self.allocated.load(Relaxed),
            freed: self.freed.load(Relaxed),
            acquired: self.acquired.load(Relaxed),
            released: self.released.load(Relaxed),
            bytes_received: self.bytes_received.load(Relaxed),
            bytes_processed: self.bytes_processed.load(Relaxed),
            overflows: self.overflows.load(Relaxed),
            idle_resets: self.idle_resets.load(Relaxed),
            intake_state: IntakeState::try_from(self.intake_state.load(Relaxed))
                .unwrap_or(IntakeState::Init),
            processor_state: ProcessorState::try_from(self.processor_state.load(Relaxed))
                .unwrap_or(ProcessorState::Idle),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub in_circulation: usize,
    pub high_water: usize,
    pub allocated: usize,
    pub freed: usize,
    pub acquired: usize,
    pub released: usize,
    pub bytes_received: usize,
    pub bytes_processed: usize,
    pub overflows: usize,
    pub idle_resets: usize,
    pub intake_state: IntakeState,
    pub processor_state: ProcessorState,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[State] Intake {:?} Processor {:?}\r\n",
            self.intake_state, self.processor_state
        )?;
        write!(
            f,
            "[Mem] Live {} Max {} Alloc {} Free {}\r\n",
            self.in_circulation, self.high_water, self.allocated, self.freed
        )?;
        write!(
            f,
            "[Data] Received {} Processed {}\r\n",
            self.bytes_received, self.bytes_processed
        )?;
        write!(
            f,
            "[Intake] Overflows {} Idle resets {}\r\n",
            self.overflows, self.idle_resets
        )
    }
}
