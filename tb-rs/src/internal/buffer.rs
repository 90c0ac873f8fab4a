//! Buffer management for io_uring operations.
//!
//! io_uring takes ownership of a buffer for the duration of a read and hands
//! it back on completion. Receive buffers are pooled so that the storage moves
//! between the pool and the kernel without reallocating per read.

/// Owned buffer for I/O operations.
#[derive(Debug)]
pub struct OwnedBuf {
    data: Vec<u8>,
    len: usize,
}

impl OwnedBuf {
    /// Create a new buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            len: 0,
        }
    }

    /// Rebuild a buffer from storage returned by a completed read of `len` bytes.
    pub fn from_read(data: Vec<u8>, len: usize) -> Self {
        let len = len.min(data.len());
        Self { data, len }
    }

    /// Hand the storage to a completion-based read.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Get the capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get a slice of the valid data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Pool of reusable receive buffers.
pub struct BufferPool {
    available: Vec<OwnedBuf>,
    buffer_size: usize,
}

impl BufferPool {
    /// Create a new pool.
    pub fn new(count: usize, buffer_size: usize) -> Self {
        let available = (0..count)
            .map(|_| OwnedBuf::with_capacity(buffer_size))
            .collect();

        Self {
            available,
            buffer_size,
        }
    }

    /// Acquire a buffer from the pool, growing it when empty.
    pub fn acquire(&mut self) -> OwnedBuf {
        match self.available.pop() {
            Some(mut buf) => {
                buf.len = 0;
                buf
            }
            None => OwnedBuf::with_capacity(self.buffer_size),
        }
    }

    /// Release a buffer back to the pool.
    ///
    /// Buffers whose storage no longer matches the pool size are dropped.
    pub fn release(&mut self, buf: OwnedBuf) {
        if buf.capacity() == self.buffer_size {
            self.available.push(buf);
        }
    }
}
