//! `tokio_util::codec` adapter for use with `FramedRead`/`FramedWrite`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::FrameError;
use crate::extractor::{scan, Scan};

/// Stream codec for STX/ETX frames.
///
/// Decoding skips noise and corrupt candidates the same way the blocking
/// [`FrameReader`](crate::FrameReader) does. Between calls at most
/// `buffer_capacity` bytes are held; older bytes are dropped.
#[derive(Debug, Clone, Default)]
pub struct StxCodec {
    config: FrameConfig,
    evicted: u64,
}

impl StxCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config, evicted: 0 }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Bytes dropped so far because the held data outgrew `buffer_capacity`.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    fn take(&mut self, src: &mut BytesMut, start: usize, end: usize) -> Option<Frame> {
        let mut wire = src.split_to(end);
        wire.advance(start);
        let frame = decode_frame(&wire);
        if frame.is_some() {
            debug!(len = wire.len(), skipped = start, "decoded frame");
        }
        frame
    }

    fn bound(&mut self, src: &mut BytesMut) {
        let excess = src.len().saturating_sub(self.config.buffer_capacity);
        if excess > 0 {
            trace!(excess, "dropping oldest buffered bytes");
            src.advance(excess);
            self.evicted += excess as u64;
        }
    }
}

impl Decoder for StxCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        loop {
            match scan(src) {
                Scan::Found { start, end } => {
                    if let Some(frame) = self.take(src, start, end) {
                        return Ok(Some(frame));
                    }
                }
                Scan::Pending { start, .. } => {
                    src.advance(start);
                    self.bound(src);
                    return Ok(None);
                }
                Scan::Nothing => {
                    src.clear();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if let Scan::Pending {
            fallback: Some(frame),
            ..
        } = scan(src)
        {
            return Ok(self.take(src, frame.start, frame.end));
        }
        if !src.is_empty() {
            trace!(len = src.len(), "discarding unterminated candidate at EOF");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<&Frame> for StxCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        let size = frame.wire_size();
        if size > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size,
                max: self.config.max_frame_size,
            });
        }
        encode_frame(frame.addr, frame.cmd, &frame.payload, dst);
        Ok(())
    }
}

impl Encoder<Frame> for StxCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        Encoder::<&Frame>::encode(self, &frame, dst)
    }
}
