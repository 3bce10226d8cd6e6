/// Errors that can occur while reading or writing framed streams.
///
/// Malformed frames are not errors: verification and extraction report them
/// as `false`/`None` and the stream scan resynchronizes on its own.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The encoded frame exceeds the configured maximum wire size.
    #[error("frame too large ({size} bytes on the wire, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete, valid frame was received.
    #[error("connection closed (no complete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
