//! Fixed-capacity byte store with oldest-first eviction.

use std::collections::VecDeque;

use bytes::Bytes;

/// Default stream buffer capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 200;

/// Accumulates incoming stream bytes up to a fixed capacity.
///
/// When full, writing a byte first evicts the oldest one. Overflow is never an
/// error: callers that cannot afford to lose data must drain often enough.
/// A zero-capacity buffer holds nothing and drops every write.
///
/// The buffer is single-writer/single-reader. Share it between threads only
/// behind a lock.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    capacity: usize,
    bytes: VecDeque<u8>,
    evicted: u64,
}

impl StreamBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bytes: VecDeque::with_capacity(capacity),
            evicted: 0,
        }
    }

    /// Append one byte, evicting the oldest if the buffer is full.
    pub fn write(&mut self, byte: u8) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.bytes.len() == self.capacity {
            self.bytes.pop_front();
            self.evicted += 1;
        }
        self.bytes.push_back(byte);
    }

    /// Append a burst of bytes in order.
    pub fn write_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write(byte);
        }
    }

    /// Take every byte currently held, oldest first, leaving the buffer empty.
    pub fn drain(&mut self) -> Bytes {
        let data: Vec<u8> = self.bytes.drain(..).collect();
        Bytes::from(data)
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if the next write will evict a byte.
    pub fn is_full(&self) -> bool {
        self.bytes.len() == self.capacity
    }

    /// Maximum number of bytes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of bytes lost to eviction since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl Extend<u8> for StreamBuffer {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for byte in iter {
            self.write(byte);
        }
    }
}
