//! Recovery of the first valid frame from buffered stream bytes.
//!
//! The scan is a two-state machine: `Idle` drops noise until a `START`
//! arrives, `InFrame` accumulates a candidate until an `END` closes it. A
//! closed candidate that fails verification is discarded and the scan resumes
//! in `Idle`. A `START` seen inside a candidate abandons it and opens a new one.
//!
//! Inside a candidate:
//! - the two header bytes after `START` are taken literally unless they are
//!   `START`;
//! - past the header, an `ESCAPE` makes the next byte literal;
//! - the checksum byte is not stuffed, so a reserved byte directly followed by
//!   `END` is also tried as a checksum.
//!
//! An escaped `START` may really be the start of a frame that follows a cut-off
//! one. When a candidate fails, the scan resumes at the first escaped `START`
//! inside it instead of dropping to `Idle`.

use std::ops::Range;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::buffer::StreamBuffer;
use crate::codec::verify_frame;
use crate::markers::{END, ESCAPE, START};

/// Offset of the last header byte (CMD) from the candidate's `START`.
const HEADER_END: usize = 2;

/// What happens to bytes the extractor did not return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Drain the buffer up front and discard everything not returned,
    /// including bytes after a recovered frame and an unterminated trailing
    /// candidate.
    #[default]
    Drain,
    /// Write unconsumed bytes back: everything after a recovered frame, or
    /// the trailing unterminated candidate when no frame was found.
    Retain,
}

/// Result of scanning a byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scan {
    /// A verified frame occupies `data[start..end]`.
    Found { start: usize, end: usize },
    /// No frame yet; a candidate opened at `data[start]` is still open.
    /// `fallback` is a verified frame the open candidate may still override,
    /// usable once no more bytes can arrive.
    Pending {
        start: usize,
        fallback: Option<Range<usize>>,
    },
    /// No frame and no open candidate.
    Nothing,
}

#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    escaped: bool,
    /// Latest verified reading in which an `ESCAPE` was the checksum,
    /// returned if the escaped reading never closes.
    fallback: Option<Range<usize>>,
    /// First escaped `START`; the scan resumes here if the candidate fails.
    resync: Option<usize>,
}

impl Candidate {
    fn open(start: usize) -> Self {
        Self {
            start,
            escaped: false,
            fallback: None,
            resync: None,
        }
    }
}

/// Once the data ran out inside `outer`, a frame found by resuming is only a
/// fallback: more bytes could still close `outer` itself.
fn found(outer: Option<usize>, frame: Range<usize>) -> Scan {
    match outer {
        None => Scan::Found {
            start: frame.start,
            end: frame.end,
        },
        Some(start) => Scan::Pending {
            start,
            fallback: Some(frame),
        },
    }
}

pub(crate) fn scan(data: &[u8]) -> Scan {
    let mut candidate: Option<Candidate> = None;
    let mut outer: Option<usize> = None;
    let mut i = 0;

    loop {
        let Some(&byte) = data.get(i) else {
            let resume = match &candidate {
                Some(c) if c.fallback.is_none() => c.resync.map(|resync| (c.start, resync)),
                _ => None,
            };
            let Some((start, resync)) = resume else {
                break;
            };
            // Out of data; keep `start` open but look for a frame inside it.
            outer.get_or_insert(start);
            candidate = Some(Candidate::open(resync));
            i = resync + 1;
            continue;
        };

        let Some(c) = candidate.as_mut() else {
            if byte == START {
                candidate = Some(Candidate::open(i));
            }
            i += 1;
            continue;
        };

        if c.escaped {
            c.escaped = false;
            if byte == START && c.resync.is_none() {
                c.resync = Some(i);
            }
            i += 1;
            continue;
        }

        let start = c.start;
        let in_header = i - start <= HEADER_END;
        let is_last = i + 1 == data.len();
        let next_is_end = data.get(i + 1) == Some(&END);

        match byte {
            START => {
                if !in_header && next_is_end && verify_frame(&data[start..i + 2]) {
                    return found(outer, start..i + 2);
                }
                if let Some(frame) = c.fallback.take() {
                    return found(outer, frame);
                }
                if let Some(resync) = c.resync {
                    trace!(from = start, resync, "candidate abandoned; resuming at escaped START");
                    candidate = Some(Candidate::open(resync));
                    i = resync + 1;
                    continue;
                }
                trace!(abandoned = i - start, "new START abandons candidate");
                candidate = Some(Candidate::open(i));
            }
            _ if in_header => {}
            END => {
                if verify_frame(&data[start..=i]) {
                    return found(outer, start..i + 1);
                }
                if next_is_end || is_last {
                    // This END may be the checksum byte; the next one closes.
                    i += 1;
                    continue;
                }
                if let Some(frame) = c.fallback.take() {
                    return found(outer, frame);
                }
                if let Some(resync) = c.resync {
                    trace!(from = start, resync, "invalid candidate; resuming at escaped START");
                    candidate = Some(Candidate::open(resync));
                    i = resync + 1;
                    continue;
                }
                trace!(len = i + 1 - start, "discarding invalid candidate");
                candidate = None;
            }
            ESCAPE => {
                if next_is_end && verify_frame(&data[start..i + 2]) {
                    c.fallback = Some(start..i + 2);
                }
                c.escaped = true;
            }
            _ => {}
        }
        i += 1;
    }

    match (candidate, outer) {
        (None, None) => Scan::Nothing,
        (None, Some(start)) => Scan::Pending {
            start,
            fallback: None,
        },
        (Some(c), outer) => Scan::Pending {
            start: outer.unwrap_or(c.start),
            fallback: c.fallback,
        },
    }
}

/// Locate the first valid frame in `data`, returning its byte range.
pub fn find_frame(data: &[u8]) -> Option<Range<usize>> {
    match scan(data) {
        Scan::Found { start, end } => Some(start..end),
        Scan::Pending { fallback, .. } => fallback,
        Scan::Nothing => None,
    }
}

/// Pulls the first valid frame out of a [`StreamBuffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamExtractor {
    mode: ExtractMode,
}

impl StreamExtractor {
    /// Create an extractor in [`ExtractMode::Drain`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with an explicit mode.
    pub fn with_mode(mode: ExtractMode) -> Self {
        Self { mode }
    }

    /// The extractor's mode.
    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Drain `buffer` and return the first complete, checksum-valid wire
    /// frame in it.
    ///
    /// `None` means no frame was found; it is not an error. In
    /// [`ExtractMode::Drain`] the buffer is always empty afterwards.
    pub fn extract(&self, buffer: &mut StreamBuffer) -> Option<Bytes> {
        self.extract_inner(buffer, self.mode)
    }

    /// Like [`extract`](Self::extract), for when no more bytes will arrive.
    ///
    /// Always drains: a candidate that can only be closed by future bytes is
    /// resolved now or dropped.
    pub fn finish(&self, buffer: &mut StreamBuffer) -> Option<Bytes> {
        self.extract_inner(buffer, ExtractMode::Drain)
    }

    fn extract_inner(&self, buffer: &mut StreamBuffer, mode: ExtractMode) -> Option<Bytes> {
        let data = buffer.drain();
        if data.is_empty() {
            return None;
        }

        match scan(&data) {
            Scan::Found { start, end } => {
                debug!(
                    len = end - start,
                    skipped = start,
                    trailing = data.len() - end,
                    "recovered frame"
                );
                retain(mode, buffer, &data[end..]);
                Some(data.slice(start..end))
            }
            Scan::Pending {
                fallback: Some(frame),
                ..
            } if mode == ExtractMode::Drain => {
                debug!(
                    len = frame.len(),
                    skipped = frame.start,
                    "recovered frame at end of data"
                );
                Some(data.slice(frame))
            }
            Scan::Pending { start, .. } => {
                trace!(skipped = start, pending = data.len() - start, "no frame yet");
                retain(mode, buffer, &data[start..]);
                None
            }
            Scan::Nothing => {
                trace!(skipped = data.len(), "no frame in buffer");
                None
            }
        }
    }
}

fn retain(mode: ExtractMode, buffer: &mut StreamBuffer, rest: &[u8]) {
    if mode == ExtractMode::Retain && !rest.is_empty() {
        debug!(len = rest.len(), "re-buffering unconsumed bytes");
        buffer.write_all(rest);
    }
}

/// Drain `buffer` and return its first valid frame, discarding everything else.
pub fn extract_frame(buffer: &mut StreamBuffer) -> Option<Bytes> {
    StreamExtractor::new().extract(buffer)
}
