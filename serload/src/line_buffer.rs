//! Fixed-capacity byte container moved between the interrupt and
//! worker contexts.

pub struct LineBuffer<const N: usize> {
    data: [u8; N],
    len: usize,
    gap: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub fn new() -> Self {
        Self {
            data: [0; N],
            len: 0,
            gap: false,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn remaining(&self) -> usize {
        N - self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Append one byte, handing it back when the buffer is full
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }

        self.data[self.len] = byte;
        self.len += 1;

        Ok(())
    }

    /// Append as much of `bytes` as fits and return how much that was
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.remaining());

        self.data[self.len..self.len + count].copy_from_slice(&bytes[..count]);
        self.len += count;

        count
    }

    /// Note that the line went idle before this buffer's first byte
    pub fn mark_gap(&mut self) {
        self.gap = true;
    }

    /// True when bytes received before this buffer are not contiguous
    /// with it
    pub fn follows_gap(&self) -> bool {
        self.gap
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.len = 0;
        self.gap = false;
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
