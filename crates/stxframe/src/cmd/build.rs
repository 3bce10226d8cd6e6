use std::fs;

use stxframe_frame::markers::{is_reserved, marker_name};
use stxframe_frame::{Frame, FrameError};
use tracing::warn;

use crate::cmd::{decode_hex, BuildArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: BuildArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let frame = Frame::new(args.addr, args.cmd, payload);

    let size = frame.wire_size();
    if size > args.max_frame_size {
        return Err(frame_error(
            "build failed",
            FrameError::FrameTooLarge {
                size,
                max: args.max_frame_size,
            },
        ));
    }
    let checksum = frame.checksum();
    if is_reserved(checksum) {
        warn!(
            checksum,
            marker = marker_name(checksum),
            "checksum collides with a marker byte; receivers recover it by lookahead"
        );
    }

    print_wire(&frame, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &BuildArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return decode_hex("--hex", hex);
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
