//! CRC-8 checksum engine.
//!
//! Polynomial 0x07, initial value 0x00, MSB-first, no reflection and no final
//! XOR (the catalogue name is CRC-8/SMBUS).

use crc::{Crc, Digest, CRC_8_SMBUS};

/// Polynomial of the frame checksum.
pub const POLYNOMIAL: u8 = 0x07;

static CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Compute the checksum of a byte sequence.
pub fn checksum(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

/// Compute the checksum of a frame's logical content: `addr · cmd · payload`.
///
/// The payload is the unstuffed one; the checksum covers content, not wire
/// bytes.
pub fn frame_checksum(addr: u8, cmd: u8, payload: &[u8]) -> u8 {
    let mut digest = digest();
    digest.update(&[addr, cmd]);
    digest.update(payload);
    digest.finalize()
}

/// Start an incremental checksum over the frame polynomial.
pub fn digest() -> Digest<'static, u8> {
    CRC8.digest()
}
