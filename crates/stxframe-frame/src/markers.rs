//! Reserved byte values.
//!
//! Only payload bytes are escaped. The address, command and checksum bytes go
//! on the wire verbatim even when they collide with one of these values.

/// Frame start delimiter (ASCII STX).
pub const START: u8 = 0x02;

/// Frame end delimiter (ASCII ETX).
pub const END: u8 = 0x03;

/// Escape prefix (ASCII ESC). Marks exactly the next byte as literal data.
pub const ESCAPE: u8 = 0x1B;

/// Bytes a frame adds around its stuffed payload: START, addr, cmd, checksum, END.
pub const FRAME_OVERHEAD: usize = 5;

/// Smallest well-formed frame: an empty payload.
pub const MIN_FRAME_LEN: usize = FRAME_OVERHEAD;

/// Returns a human-readable name for a byte value.
pub fn marker_name(byte: u8) -> &'static str {
    match byte {
        START => "START",
        END => "END",
        ESCAPE => "ESCAPE",
        _ => "DATA",
    }
}

/// Returns true if the byte must be escaped inside a payload.
pub fn is_reserved(byte: u8) -> bool {
    matches!(byte, START | END | ESCAPE)
}
