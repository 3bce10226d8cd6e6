use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::buffer::StreamBuffer;
use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::extractor::{ExtractMode, StreamExtractor};
use crate::markers::END;

const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete frames from any `Read` stream.
///
/// Incoming bytes pass through a [`StreamBuffer`] of `buffer_capacity`
/// bytes; extraction runs each time an `END` byte arrives. The reader keeps
/// unconsumed bytes between extractions ([`ExtractMode::Retain`]), so frames
/// split across reads and frames sent back to back are all delivered.
pub struct FrameReader<T> {
    inner: T,
    input: BytesMut,
    buffer: StreamBuffer,
    extractor: StreamExtractor,
    rescan: bool,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            input: BytesMut::with_capacity(READ_CHUNK_SIZE),
            buffer: StreamBuffer::new(config.buffer_capacity),
            extractor: StreamExtractor::with_mode(ExtractMode::Retain),
            rescan: false,
            config,
        }
    }

    /// Read the next valid frame (blocking).
    ///
    /// Noise and corrupt frames are skipped. Returns
    /// `Err(FrameError::ConnectionClosed)` once EOF is reached and no frame
    /// remains.
    pub fn read_frame(&mut self) -> Result<Frame> {
        if self.rescan {
            self.rescan = false;
            if let Some(frame) = self.next_buffered(false) {
                return Ok(frame);
            }
        }

        loop {
            while self.input.has_remaining() {
                let byte = self.input.get_u8();
                self.buffer.write(byte);
                if byte == END {
                    if let Some(frame) = self.next_buffered(false) {
                        return Ok(frame);
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return self
                    .next_buffered(true)
                    .ok_or(FrameError::ConnectionClosed);
            }

            self.input.extend_from_slice(&chunk[..read]);
        }
    }

    fn next_buffered(&mut self, eof: bool) -> Option<Frame> {
        let wire = if eof {
            self.extractor.finish(&mut self.buffer)
        } else {
            self.extractor.extract(&mut self.buffer)
        }?;
        self.rescan = !eof;
        decode_frame(&wire)
    }

    /// Bytes lost to buffer overflow so far.
    pub fn evicted(&self) -> u64 {
        self.buffer.evicted()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream closes.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
