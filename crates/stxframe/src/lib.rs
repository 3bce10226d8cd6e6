//! STX/ETX byte-stuffed framing with CRC-8 for serial links.
//!
//! This crate is the public facade; the protocol lives in
//! [`stxframe_frame`] and is re-exported as [`frame`].
//!
//! ```
//! use stxframe::frame::{build_frame, extract_frame, verify_frame, StreamBuffer};
//!
//! let wire = build_frame(0x05, 0x10, b"ping");
//! assert!(verify_frame(&wire));
//!
//! let mut buffer = StreamBuffer::new(200);
//! buffer.write_all(&[0x55, 0xAA]);
//! buffer.write_all(&wire);
//! assert_eq!(extract_frame(&mut buffer).as_deref(), Some(&wire[..]));
//! ```

/// Re-export frame types.
pub mod frame {
    pub use stxframe_frame::*;
}
