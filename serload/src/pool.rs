//! Buffer pool recycling line buffers between intake and worker.
//!
//! The free-list is a single-producer/single-consumer queue: the worker
//! pushes released buffers, the interrupt pops them. Neither side takes a
//! lock. When the free-list is empty the interrupt falls back to a heap
//! allocation, and once more than `recycle_cap` buffers are alive released
//! buffers are freed instead of pooled.

use alloc::boxed::Box;

use heapless::spsc::{Consumer, Producer, Queue};
use log::debug;

use crate::config::POOL_DEPTH;
use crate::line_buffer::LineBuffer;
use crate::stats::Stats;

pub struct BufferPool<const N: usize> {
    free: Queue<Box<LineBuffer<N>>, POOL_DEPTH>,
}

impl<const N: usize> BufferPool<N> {
    pub const fn new() -> Self {
        Self { free: Queue::new() }
    }

    /// Split the pool into its interrupt half and its worker half
    pub fn split<'a>(
        &'a mut self,
        stats: &'a Stats,
        recycle_cap: usize,
    ) -> (Acquirer<'a, N>, Recycler<'a, N>) {
        let (producer, consumer) = self.free.split();

        (
            Acquirer {
                free: consumer,
                stats,
            },
            Recycler {
                free: producer,
                stats,
                recycle_cap,
            },
        )
    }
}

impl<const N: usize> Default for BufferPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt side of the pool
pub struct Acquirer<'a, const N: usize> {
    free: Consumer<'a, Box<LineBuffer<N>>, POOL_DEPTH>,
    stats: &'a Stats,
}

impl<'a, const N: usize> Acquirer<'a, N> {
    /// Pop a pooled buffer or allocate a fresh zeroed one. Never blocks.
    pub fn acquire(&mut self) -> Box<LineBuffer<N>> {
        self.stats.note_acquire();

        if let Some(mut buffer) = self.free.dequeue() {
            buffer.clear();
            return buffer;
        }

        self.stats.note_alloc();
        debug!("pool empty, allocated buffer #{}", self.stats.in_circulation());

        Box::new(LineBuffer::new())
    }

    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

/// Worker side of the pool
pub struct Recycler<'a, const N: usize> {
    free: Producer<'a, Box<LineBuffer<N>>, POOL_DEPTH>,
    stats: &'a Stats,
    recycle_cap: usize,
}

impl<'a, const N: usize> Recycler<'a, N> {
    /// Give a consumed buffer back. Pooled while circulation is within the
    /// recycle cap, freed otherwise.
    pub fn release(&mut self, buffer: Box<LineBuffer<N>>) {
        self.stats.note_release();

        if self.stats.in_circulation() > self.recycle_cap {
            drop(buffer);
            self.stats.note_free();
            return;
        }

        if let Err(buffer) = self.free.enqueue(buffer) {
            drop(buffer);
            self.stats.note_free();
        }
    }
}
