use stxframe_frame::decode_frame;
use tracing::debug;

use crate::cmd::{decode_hex, VerifyArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_verdict, OutputFormat};

pub fn run(args: VerifyArgs, format: OutputFormat) -> CliResult<i32> {
    let input = decode_hex("frame", &args.frame)?;
    let frame = decode_frame(&input);
    debug!(len = input.len(), valid = frame.is_some(), "verified frame");

    print_verdict(&input, frame.as_ref(), format);
    Ok(if frame.is_some() { SUCCESS } else { DATA_INVALID })
}
