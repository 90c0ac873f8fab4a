//! Framed reader and writer for the Vortex driver protocol.
//!
//! The [`Reader`] reads sized chunks into a scratch buffer and decodes
//! little-endian scalars from it. The entire chunk must be consumed before
//! the next chunk is read.
//!
//! The [`Writer`] allocates a buffer of a declared size and encodes
//! little-endian scalars into it. The entire buffer must be filled before it
//! is flushed, and flushed before the next buffer is allocated.
//!
//! Both scratch buffers are reused across requests, so the steady state
//! performs no allocation once the largest batch has been seen.

use std::io::{ErrorKind, Read, Write};

use crate::error::{DriverError, Result};

/// Reads sized chunks from an input channel and decodes them.
#[derive(Debug)]
pub struct Reader<R> {
    input: R,
    buffer: Vec<u8>,
    position: usize,
}

impl<R: Read> Reader<R> {
    /// Create a reader over the given input channel.
    pub fn new(input: R) -> Self {
        Self {
            input,
            buffer: Vec::new(),
            position: 0,
        }
    }

    /// Bytes of the current chunk not yet decoded.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Read exactly `count` bytes into the scratch buffer.
    ///
    /// Fails if the previous chunk was not fully consumed, or if the input
    /// closes before `count` bytes arrived.
    pub fn begin(&mut self, count: usize) -> Result<()> {
        if self.try_begin(count)? {
            Ok(())
        } else {
            Err(DriverError::EndOfStream {
                expected: count,
                received: 0,
            })
        }
    }

    /// Like [`Reader::begin`], but returns `Ok(false)` if the input was
    /// already closed before the first byte of the chunk.
    pub fn try_begin(&mut self, count: usize) -> Result<bool> {
        let remaining = self.remaining();
        if remaining > 0 {
            return Err(DriverError::ReadPending { remaining });
        }

        self.buffer.clear();
        self.buffer.resize(count, 0);
        self.position = 0;

        let mut received = 0;
        while received < count {
            match self.input.read(&mut self.buffer[received..]) {
                Ok(0) => {
                    self.buffer.clear();
                    if received == 0 {
                        return Ok(false);
                    }
                    return Err(DriverError::EndOfStream {
                        expected: count,
                        received,
                    });
                }
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e.into());
                }
            }
        }

        Ok(true)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let remaining = self.remaining();
        if remaining < N {
            return Err(DriverError::Overrun {
                width: N,
                remaining,
            });
        }

        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buffer[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }

    /// Decode a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Decode a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Decode a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Decode a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// Take the next 16 bytes verbatim.
    pub fn read_bytes16(&mut self) -> Result<[u8; 16]> {
        self.take()
    }
}

/// Encodes values into a sized buffer and writes it to an output channel.
#[derive(Debug)]
pub struct Writer<W> {
    output: W,
    buffer: Vec<u8>,
    size: usize,
}

impl<W: Write> Writer<W> {
    /// Create a writer over the given output channel.
    pub fn new(output: W) -> Self {
        Self {
            output,
            buffer: Vec::new(),
            size: 0,
        }
    }

    /// Bytes of the current buffer not yet written.
    pub fn remaining(&self) -> usize {
        self.size - self.buffer.len()
    }

    /// Allocate a buffer of exactly `size` bytes.
    ///
    /// Fails if the previous buffer was not completely filled.
    pub fn begin(&mut self, size: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining > 0 {
            return Err(DriverError::WritePending { remaining });
        }

        self.buffer.clear();
        self.buffer.reserve(size);
        self.size = size;
        Ok(())
    }

    /// Write the buffer to the output channel. The buffer must be full.
    pub fn flush(&mut self) -> Result<()> {
        let remaining = self.remaining();
        if remaining > 0 {
            return Err(DriverError::FlushIncomplete { remaining });
        }

        self.output.write_all(&self.buffer)?;
        self.output.flush()?;

        self.buffer.clear();
        self.size = 0;
        Ok(())
    }

    /// Consume the writer, returning the output channel.
    pub fn into_inner(self) -> W {
        self.output
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = self.remaining();
        if remaining < bytes.len() {
            return Err(DriverError::Overrun {
                width: bytes.len(),
                remaining,
            });
        }

        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Encode a `u8`.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    /// Encode a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Encode a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Encode a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    /// Copy 16 bytes verbatim.
    pub fn write_bytes16(&mut self, value: [u8; 16]) -> Result<()> {
        self.put(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Input that delivers at most `chunk` bytes per read and fails once
    /// with `Interrupted` before the first read.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        chunk: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.chunk);
            self.data.read(&mut buf[..n])
        }
    }

    /// Output that accepts at most `chunk` bytes per write.
    struct Narrow {
        data: Vec<u8>,
        chunk: usize,
    }

    impl Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_little_endian_u32() {
        let data = [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0];
        let mut reader = Reader::new(&data[..]);
        reader.begin(12).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 256);
        assert_eq!(reader.read_u32().unwrap(), 65536);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_scalar_roundtrip() {
        let blob: [u8; 16] = std::array::from_fn(|i| i as u8 * 17);

        let mut writer = Writer::new(Vec::new());
        writer.begin(1 + 2 + 4 + 8 + 16).unwrap();
        writer.write_u8(0xAB).unwrap();
        writer.write_u16(0xBEEF).unwrap();
        writer.write_u32(u32::MAX - 1).unwrap();
        writer.write_u64(0x0102_0304_0506_0708).unwrap();
        writer.write_bytes16(blob).unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner();

        assert_eq!(&bytes[1..3], &[0xEF, 0xBE]);

        let mut reader = Reader::new(&bytes[..]);
        reader.begin(bytes.len()).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_u32().unwrap(), u32::MAX - 1);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(reader.read_bytes16().unwrap(), blob);
    }

    #[test]
    fn test_reader_begin_after_drain() {
        let data = [7u8, 8];
        let mut reader = Reader::new(&data[..]);
        reader.begin(1).unwrap();
        reader.read_u8().unwrap();
        reader.begin(1).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 8);
    }

    #[test]
    fn test_reader_begin_with_pending_bytes() {
        let data = [0u8; 8];
        let mut reader = Reader::new(&data[..]);
        reader.begin(4).unwrap();
        reader.read_u8().unwrap();
        assert!(matches!(
            reader.begin(4),
            Err(DriverError::ReadPending { remaining: 3 })
        ));
    }

    #[test]
    fn test_reader_clean_end_of_stream() {
        let mut reader = Reader::new(io::empty());
        assert!(!reader.try_begin(5).unwrap());
        assert!(matches!(
            reader.begin(5),
            Err(DriverError::EndOfStream {
                expected: 5,
                received: 0
            })
        ));
    }

    #[test]
    fn test_reader_short_read() {
        let data = [1u8, 2, 3];
        let mut reader = Reader::new(&data[..]);
        assert!(matches!(
            reader.try_begin(5),
            Err(DriverError::EndOfStream {
                expected: 5,
                received: 3
            })
        ));
    }

    #[test]
    fn test_reader_accumulates_partial_reads() {
        let input = Trickle {
            data: Cursor::new((0..32u8).collect()),
            chunk: 3,
            interrupted: false,
        };
        let mut reader = Reader::new(input);
        reader.begin(32).unwrap();
        assert_eq!(reader.read_bytes16().unwrap()[15], 15);
        assert_eq!(reader.read_bytes16().unwrap()[0], 16);
    }

    #[test]
    fn test_reader_overrun() {
        let data = [0u8; 3];
        let mut reader = Reader::new(&data[..]);
        reader.begin(3).unwrap();
        assert!(matches!(
            reader.read_u32(),
            Err(DriverError::Overrun {
                width: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn test_reader_zero_sized_chunk() {
        let mut reader = Reader::new(io::empty());
        reader.begin(0).unwrap();
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_writer_flush_incomplete() {
        let mut writer = Writer::new(Vec::new());
        writer.begin(8).unwrap();
        writer.write_u32(1).unwrap();
        assert!(matches!(
            writer.flush(),
            Err(DriverError::FlushIncomplete { remaining: 4 })
        ));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_writer_begin_with_pending_capacity() {
        let mut writer = Writer::new(Vec::new());
        writer.begin(4).unwrap();
        writer.write_u16(1).unwrap();
        assert!(matches!(
            writer.begin(4),
            Err(DriverError::WritePending { remaining: 2 })
        ));
    }

    #[test]
    fn test_writer_overrun() {
        let mut writer = Writer::new(Vec::new());
        writer.begin(2).unwrap();
        assert!(matches!(
            writer.write_u32(1),
            Err(DriverError::Overrun {
                width: 4,
                remaining: 2
            })
        ));
    }

    #[test]
    fn test_writer_retries_partial_writes() {
        let mut writer = Writer::new(Narrow {
            data: Vec::new(),
            chunk: 3,
        });
        writer.begin(16).unwrap();
        writer.write_bytes16([0x5A; 16]).unwrap();
        writer.flush().unwrap();
        writer.begin(4).unwrap();
        writer.write_u32(0).unwrap();
        writer.flush().unwrap();

        let output = writer.into_inner();
        assert_eq!(output.data.len(), 20);
        assert!(output.data[..16].iter().all(|&b| b == 0x5A));
    }
}
