use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::warn;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::markers::START;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.addr, frame.cmd, frame.payload.as_ref())
    }

    /// Encode and send a payload to `addr` with command `cmd`.
    ///
    /// Fails with [`FrameError::FrameTooLarge`] if the stuffed frame would not
    /// fit in `max_frame_size` bytes; nothing is written in that case.
    pub fn send(&mut self, addr: u8, cmd: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(addr, cmd, payload, &mut self.buf);

        if self.buf.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: self.buf.len(),
                max: self.config.max_frame_size,
            });
        }
        if addr == START || cmd == START {
            warn!(addr, cmd, "header byte equals START; receivers cannot resynchronize on this frame");
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the maximum wire size for subsequent frames.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::{build_frame, decode_frame, verify_frame};

    fn written(writer: FrameWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.send(0x05, 0x10, b"hello").unwrap();

        let wire = written(writer);
        assert_eq!(wire, build_frame(0x05, 0x10, b"hello").to_vec());
        assert!(verify_frame(&wire));
    }

    #[test]
    fn write_multiple_frames_back_to_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.send(1, 1, b"one").unwrap();
        writer.send(0x21, 0x22, b"two").unwrap();

        let mut expected = build_frame(1, 1, b"one").to_vec();
        expected.extend_from_slice(&build_frame(0x21, 0x22, b"two"));
        assert_eq!(written(writer), expected);
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        let frame = Frame::new(0x07, 0x09, vec![0x02, 0x03]);
        writer.write_frame(&frame).unwrap();

        let wire = written(writer);
        assert_eq!(decode_frame(&wire).unwrap(), frame);
    }

    #[test]
    fn oversized_frame_rejected_before_writing() {
        let cfg = FrameConfig {
            max_frame_size: 8,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::new()), cfg);

        // Three reserved bytes stuff to six: 5 + 6 = 11 > 8.
        let err = writer.send(1, 1, &[0x02, 0x02, 0x02]).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 11, max: 8 }));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn max_frame_size_is_adjustable() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.set_max_frame_size(5);
        assert_eq!(writer.config().max_frame_size, 5);

        writer.send(1, 1, b"").unwrap();
        assert!(writer.send(1, 1, b"x").is_err());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(1, 1, b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    fn retries_interrupted_and_would_block() {
        let sink = FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            flush_failures: vec![ErrorKind::Interrupted],
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(sink);
        writer.send(5, 6, b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, build_frame(5, 6, b"retry").to_vec());
    }

    #[test]
    fn other_io_errors_propagate() {
        let sink = FlakyWriter {
            failures: vec![ErrorKind::BrokenPipe],
            flush_failures: Vec::new(),
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(sink);
        let err = writer.send(1, 1, b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(1, 1, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails with each listed error kind once, in order, then succeeds.
    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        flush_failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failures.is_empty() {
                return Err(std::io::Error::from(self.failures.remove(0)));
            }
            // Accept at most three bytes per call to exercise partial writes.
            let n = buf.len().min(3);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_failures.is_empty() {
                return Err(std::io::Error::from(self.flush_failures.remove(0)));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
