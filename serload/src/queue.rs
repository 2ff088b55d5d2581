//! Transfer queue: ordered, bounded handoff of filled line buffers from
//! the interrupt to the worker.

use alloc::boxed::Box;

use heapless::spsc::{Consumer, Producer, Queue};

use crate::line_buffer::LineBuffer;

pub struct TransferQueue<const N: usize, const Q: usize> {
    inner: Queue<Box<LineBuffer<N>>, Q>,
}

impl<const N: usize, const Q: usize> TransferQueue<N, Q> {
    pub const fn new() -> Self {
        Self {
            inner: Queue::new(),
        }
    }

    pub fn split(&mut self) -> (Sender<'_, N, Q>, Receiver<'_, N, Q>) {
        let (producer, consumer) = self.inner.split();

        (Sender { producer }, Receiver { consumer })
    }
}

impl<const N: usize, const Q: usize> Default for TransferQueue<N, Q> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Sender<'a, const N: usize, const Q: usize> {
    producer: Producer<'a, Box<LineBuffer<N>>, Q>,
}

impl<'a, const N: usize, const Q: usize> Sender<'a, N, Q> {
    /// Non-blocking enqueue. The buffer comes back when the queue is full.
    pub fn send(&mut self, buffer: Box<LineBuffer<N>>) -> Result<(), Box<LineBuffer<N>>> {
        self.producer.enqueue(buffer)
    }

    pub fn is_full(&self) -> bool {
        !self.producer.ready()
    }
}

pub struct Receiver<'a, const N: usize, const Q: usize> {
    consumer: Consumer<'a, Box<LineBuffer<N>>, Q>,
}

impl<'a, const N: usize, const Q: usize> Receiver<'a, N, Q> {
    pub fn recv(&mut self) -> Option<Box<LineBuffer<N>>> {
        self.consumer.dequeue()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(bytes: &[u8]) -> Box<LineBuffer<4>> {
        let mut buffer = Box::new(LineBuffer::new());
        buffer.extend(bytes);
        buffer
    }

    #[test]
    fn fifo_order() {
        let mut queue = TransferQueue::<4, 4>::new();
        let (mut tx, mut rx) = queue.split();

        assert!(tx.send(filled(b"ab")).is_ok());
        assert!(tx.send(filled(b"cd")).is_ok());

        assert_eq!(rx.len(), 2);
        assert_eq!(rx.recv().map(|b| b.as_slice().to_vec()), Some(b"ab".to_vec()));
        assert_eq!(rx.recv().map(|b| b.as_slice().to_vec()), Some(b"cd".to_vec()));
        assert!(rx.recv().is_none());
    }

    #[test]
    fn full_queue_returns_buffer() {
        let mut queue = TransferQueue::<4, 2>::new();
        let (mut tx, _rx) = queue.split();

        assert!(tx.send(filled(b"a")).is_ok());
        assert!(tx.is_full());

        let rejected = tx.send(filled(b"b"));
        assert_eq!(rejected.map_err(|b| b.as_slice().to_vec()), Err(b"b".to_vec()));
    }
}
