use bytes::{BufMut, Bytes, BytesMut};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::checksum::frame_checksum;
use crate::markers::{END, FRAME_OVERHEAD, MIN_FRAME_LEN, START};
use crate::stuffing::{stuff_into, stuffed_len, unstuff};

/// A decoded frame: the logical content carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination address. Sent verbatim.
    pub addr: u8,
    /// Command code. Sent verbatim.
    pub cmd: u8,
    /// The unstuffed payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(addr: u8, cmd: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            addr,
            cmd,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame once stuffed and delimited.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + stuffed_len(&self.payload)
    }

    /// Checksum carried by this frame on the wire.
    pub fn checksum(&self) -> u8 {
        frame_checksum(self.addr, self.cmd, &self.payload)
    }

    /// Encode this frame into its wire form.
    pub fn to_wire(&self) -> Bytes {
        build_frame(self.addr, self.cmd, &self.payload)
    }
}

/// Encode a frame into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌───────┬──────┬──────┬─────────────────┬──────────┬──────┐
/// │ START │ ADDR │ CMD  │ STUFFED PAYLOAD │ CHECKSUM │ END  │
/// │ 0x02  │ (1B) │ (1B) │ (0..2n bytes)   │ (CRC-8)  │ 0x03 │
/// └───────┴──────┴──────┴─────────────────┴──────────┴──────┘
/// ```
///
/// The checksum covers `ADDR · CMD · PAYLOAD` before stuffing. No size limit
/// is applied here; see [`FrameConfig::max_frame_size`].
pub fn encode_frame(addr: u8, cmd: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(FRAME_OVERHEAD + stuffed_len(payload));
    dst.put_u8(START);
    dst.put_u8(addr);
    dst.put_u8(cmd);
    stuff_into(payload, dst);
    dst.put_u8(frame_checksum(addr, cmd, payload));
    dst.put_u8(END);
}

/// Build a standalone wire frame.
pub fn build_frame(addr: u8, cmd: u8, payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::new();
    encode_frame(addr, cmd, payload, &mut dst);
    dst.freeze()
}

/// Structural parts of a delimited candidate, before checksum validation.
struct RawParts<'a> {
    addr: u8,
    cmd: u8,
    stuffed: &'a [u8],
    received: u8,
}

fn split_frame(frame: &[u8]) -> Option<RawParts<'_>> {
    let len = frame.len();
    if len < MIN_FRAME_LEN || frame[0] != START || frame[len - 1] != END {
        return None;
    }

    // START(0) ADDR(1) CMD(2) payload[3 .. len-2] CHECKSUM(len-2) END(len-1)
    Some(RawParts {
        addr: frame[1],
        cmd: frame[2],
        stuffed: &frame[3..len - 2],
        received: frame[len - 2],
    })
}

/// Check that `frame` is a delimited frame with a matching checksum.
///
/// `frame` must already be isolated: it starts with `START`, ends with `END`
/// and is at least five bytes long, or it is rejected outright.
pub fn verify_frame(frame: &[u8]) -> bool {
    decode_frame(frame).is_some()
}

/// Verify `frame` and return its logical content.
pub fn decode_frame(frame: &[u8]) -> Option<Frame> {
    let parts = split_frame(frame)?;
    let payload = unstuff(parts.stuffed);
    if frame_checksum(parts.addr, parts.cmd, &payload) != parts.received {
        return None;
    }

    Some(Frame {
        addr: parts.addr,
        cmd: parts.cmd,
        payload: Bytes::from(payload),
    })
}

/// Configuration shared by the blocking reader and writer and the async codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Capacity of the receive-side stream buffer. Default: 200 bytes.
    pub buffer_capacity: usize,
    /// Largest wire frame a writer will emit. Default: the buffer capacity.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_frame_size: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::markers::ESCAPE;

    #[test]
    fn build_escapes_reserved_payload_bytes() {
        let frame = build_frame(0x05, 0x10, &[0xDE, 0xAD, 0x02, 0x03, 0x1B]);
        assert_eq!(
            frame.as_ref(),
            &[0x02, 0x05, 0x10, 0xDE, 0xAD, 0x1B, 0x02, 0x1B, 0x03, 0x1B, 0x1B, 0xA2, 0x03]
        );
        assert!(verify_frame(&frame));
    }

    #[test]
    fn build_empty_payload() {
        let frame = build_frame(0x05, 0x10, &[]);
        assert_eq!(frame.as_ref(), &[START, 0x05, 0x10, 0x31, END]);
        assert!(verify_frame(&frame));
    }

    #[test]
    fn header_bytes_are_never_stuffed() {
        let frame = build_frame(ESCAPE, END, b"hi");
        assert_eq!(&frame[..3], &[START, ESCAPE, END]);
        assert_eq!(frame.len(), FRAME_OVERHEAD + 2);
        assert!(verify_frame(&frame));
    }

    #[test]
    fn encode_appends_to_existing_buffer() {
        let mut dst = BytesMut::from(&b"xx"[..]);
        encode_frame(1, 2, b"a", &mut dst);
        assert_eq!(&dst[..2], b"xx");
        assert!(verify_frame(&dst[2..]));
    }

    #[test]
    fn verify_rejects_short_frames() {
        assert!(!verify_frame(&[]));
        assert!(!verify_frame(&[START, END]));
        assert!(!verify_frame(&[START, 0x05, 0x10, END]));
    }

    #[test]
    fn verify_rejects_wrong_delimiters() {
        let mut frame = build_frame(0x05, 0x10, b"abc").to_vec();
        frame[0] = 0x00;
        assert!(!verify_frame(&frame));

        let mut frame = build_frame(0x05, 0x10, b"abc").to_vec();
        let last = frame.len() - 1;
        frame[last] = 0x00;
        assert!(!verify_frame(&frame));
    }

    #[test]
    fn verify_rejects_checksum_mismatch() {
        let mut frame = build_frame(0x05, 0x10, b"abc").to_vec();
        let idx = frame.len() - 2;
        frame[idx] ^= 0xFF;
        assert!(!verify_frame(&frame));
    }

    #[test]
    fn decode_returns_logical_content() {
        let wire = build_frame(0x07, 0x09, &[1, 2, 3]);
        assert_eq!(
            wire.as_ref(),
            &[0x02, 0x07, 0x09, 0x01, 0x1B, 0x02, 0x1B, 0x03, 0xC7, 0x03]
        );

        let frame = decode_frame(&wire).unwrap();
        assert_eq!(frame, Frame::new(0x07, 0x09, vec![1, 2, 3]));
        assert_eq!(frame.checksum(), 0xC7);
        assert_eq!(frame.wire_size(), wire.len());
        assert_eq!(frame.to_wire(), wire);
    }

    #[test]
    fn default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.buffer_capacity, 200);
        assert_eq!(cfg.max_frame_size, cfg.buffer_capacity);
    }

    proptest! {
        #[test]
        fn prop_built_frames_verify(
            addr in any::<u8>(),
            cmd in any::<u8>(),
            payload in prop::collection::vec(any::<u8>(), 0..128),
        ) {
            let frame = build_frame(addr, cmd, &payload);
            prop_assert!(verify_frame(&frame));
            let decoded = decode_frame(&frame).unwrap();
            prop_assert_eq!(decoded.payload.as_ref(), payload.as_slice());
        }

        #[test]
        fn prop_single_bit_flip_in_payload_or_checksum_is_detected(
            addr in any::<u8>(),
            cmd in any::<u8>(),
            payload in prop::collection::vec(any::<u8>(), 1..64),
            pick in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            // Flip a bit in the logical payload, or in the checksum byte.
            let frame = build_frame(addr, cmd, &payload);
            let slot = pick.index(payload.len() + 1);
            let corrupted = if slot < payload.len() {
                let mut flipped = payload.clone();
                flipped[slot] ^= 1 << bit;
                let mut wire = BytesMut::new();
                wire.put_u8(START);
                wire.put_u8(addr);
                wire.put_u8(cmd);
                stuff_into(&flipped, &mut wire);
                wire.put_u8(frame[frame.len() - 2]);
                wire.put_u8(END);
                wire.to_vec()
            } else {
                let mut wire = frame.to_vec();
                let idx = wire.len() - 2;
                wire[idx] ^= 1 << bit;
                wire
            };
            prop_assert!(!verify_frame(&corrupted));
        }
    }
}
