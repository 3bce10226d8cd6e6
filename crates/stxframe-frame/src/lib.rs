//! STX/ETX byte-stuffed framing with CRC-8 for serial and byte-stream links.
//!
//! Every frame on the wire is:
//! - a `START` (0x02) delimiter
//! - one address byte and one command byte, sent verbatim
//! - the payload, with `START`/`END`/`ESCAPE` bytes prefixed by `ESCAPE`
//! - a CRC-8 (poly 0x07) over address, command and unstuffed payload
//! - an `END` (0x03) delimiter
//!
//! The receive side keeps a bounded [`StreamBuffer`] and pulls the first valid
//! frame out of it with a [`StreamExtractor`], skipping noise and corrupt
//! candidates.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod buffer;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod markers;
pub mod reader;
pub mod stuffing;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::StxCodec;
pub use buffer::{StreamBuffer, DEFAULT_BUFFER_CAPACITY};
pub use checksum::{checksum, frame_checksum};
pub use codec::{build_frame, decode_frame, encode_frame, verify_frame, Frame, FrameConfig};
pub use error::{FrameError, Result};
pub use extractor::{extract_frame, find_frame, ExtractMode, StreamExtractor};
pub use markers::{END, ESCAPE, FRAME_OVERHEAD, MIN_FRAME_LEN, START};
pub use reader::FrameReader;
pub use stuffing::{stuff, unstuff};
pub use writer::FrameWriter;
