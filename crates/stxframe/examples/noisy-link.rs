//! Simulated noisy serial link: a writer emits frames, a line injects garbage
//! and a corrupted copy, and a reader recovers the clean frames.
//!
//! Run with:
//!   cargo run --example noisy-link

use std::io::Cursor;

use stxframe::frame::{FrameReader, FrameWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = FrameWriter::new(Vec::new());
    writer.send(0x05, 0x10, b"temperature=21.5")?;
    writer.send(0x05, 0x11, &[0x02, 0x03, 0x1B])?;
    writer.send(0x06, 0x20, b"ack")?;
    let clean = writer.into_inner();

    // Line noise before, between and after frames, plus a flipped bit.
    let mut line = vec![0xFF, 0x03, 0x7E];
    line.extend_from_slice(&clean);
    let mut corrupted = clean.clone();
    corrupted[4] ^= 0x01;
    line.extend_from_slice(&corrupted);
    line.extend_from_slice(&[0x00, 0x02]);

    eprintln!("line carries {} bytes ({} clean)", line.len(), clean.len());

    for frame in FrameReader::new(Cursor::new(line)) {
        let frame = frame?;
        eprintln!(
            "addr=0x{:02X} cmd=0x{:02X} payload={:02X?}",
            frame.addr,
            frame.cmd,
            frame.payload.as_ref()
        );
    }

    Ok(())
}
