//! Byte stuffing for payload data.
//!
//! Every payload byte equal to `START`, `END` or `ESCAPE` is preceded by
//! `ESCAPE`. Unstuffing drops each `ESCAPE` and keeps the following byte
//! verbatim, whatever its value.

use bytes::BufMut;

use crate::markers::{is_reserved, ESCAPE};

/// Escape reserved bytes in `payload`.
pub fn stuff(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stuffed_len(payload));
    stuff_into(payload, &mut out);
    out
}

/// Escape reserved bytes in `payload`, appending to `dst`.
pub fn stuff_into<B: BufMut>(payload: &[u8], dst: &mut B) {
    for &byte in payload {
        if is_reserved(byte) {
            dst.put_u8(ESCAPE);
        }
        dst.put_u8(byte);
    }
}

/// Length `payload` will have once stuffed.
pub fn stuffed_len(payload: &[u8]) -> usize {
    payload.len() + payload.iter().filter(|b| is_reserved(**b)).count()
}

/// Reverse [`stuff`].
///
/// Accepts any byte sequence. A trailing `ESCAPE` with nothing after it is
/// dropped silently.
pub fn unstuff(stuffed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stuffed.len());
    unstuff_into(stuffed, &mut out);
    out
}

/// Reverse [`stuff`], appending to `dst`.
pub fn unstuff_into<B: BufMut>(stuffed: &[u8], dst: &mut B) {
    let mut escaped = false;
    for &byte in stuffed {
        if escaped {
            dst.put_u8(byte);
            escaped = false;
        } else if byte == ESCAPE {
            escaped = true;
        } else {
            dst.put_u8(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::markers::{END, START};

    #[test]
    fn plain_bytes_pass_through() {
        let payload = [0x00, 0x01, 0x41, 0xDE, 0xAD, 0xFF];
        assert_eq!(stuff(&payload), payload.to_vec());
        assert_eq!(unstuff(&payload), payload.to_vec());
    }

    #[test]
    fn reserved_bytes_are_escaped() {
        let payload = [0xDE, 0xAD, START, END, ESCAPE];
        assert_eq!(
            stuff(&payload),
            vec![0xDE, 0xAD, ESCAPE, START, ESCAPE, END, ESCAPE, ESCAPE]
        );
    }

    #[test]
    fn escape_makes_next_byte_literal() {
        assert_eq!(unstuff(&[ESCAPE, ESCAPE, ESCAPE, START]), vec![ESCAPE, START]);
        assert_eq!(unstuff(&[ESCAPE, 0x41]), vec![0x41]);
    }

    #[test]
    fn dangling_escape_is_dropped() {
        assert_eq!(unstuff(&[0x10, 0x20, ESCAPE]), vec![0x10, 0x20]);
        assert_eq!(unstuff(&[ESCAPE]), Vec::<u8>::new());
    }

    #[test]
    fn stuffed_len_counts_escapes() {
        assert_eq!(stuffed_len(&[]), 0);
        assert_eq!(stuffed_len(&[START, 0x00, END]), 5);
    }

    #[test]
    fn stuff_into_appends() {
        let mut dst = bytes::BytesMut::from(&[0xAA][..]);
        stuff_into(&[END], &mut dst);
        assert_eq!(dst.as_ref(), &[0xAA, ESCAPE, END]);
    }

    proptest! {
        #[test]
        fn prop_unstuff_reverses_stuff(payload in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(unstuff(&stuff(&payload)), payload);
        }

        #[test]
        fn prop_stuff_never_shrinks(payload in prop::collection::vec(any::<u8>(), 0..256)) {
            let stuffed = stuff(&payload);
            prop_assert!(stuffed.len() >= payload.len());
            prop_assert_eq!(stuffed.len(), stuffed_len(&payload));
        }

        #[test]
        fn prop_stuffed_has_no_bare_delimiters(payload in prop::collection::vec(any::<u8>(), 0..256)) {
            let stuffed = stuff(&payload);
            let mut escaped = false;
            for byte in stuffed {
                if escaped {
                    escaped = false;
                    continue;
                }
                prop_assert!(byte != START && byte != END);
                escaped = byte == ESCAPE;
            }
        }
    }
}
