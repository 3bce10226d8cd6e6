use std::fs;
use std::io::Read;

use stxframe_frame::{decode_frame, ExtractMode, StreamBuffer, StreamExtractor};
use tracing::{debug, info};

use crate::cmd::{decode_hex, ExtractArgs};
use crate::exit::{io_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ExtractArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = read_input(&args)?;

    let mut buffer = StreamBuffer::new(args.capacity);
    buffer.write_all(&bytes);
    if buffer.evicted() > 0 {
        info!(
            evicted = buffer.evicted(),
            capacity = args.capacity,
            "input exceeded buffer capacity; oldest bytes dropped"
        );
    }

    let mode = if args.retain || args.all {
        ExtractMode::Retain
    } else {
        ExtractMode::Drain
    };
    let extractor = StreamExtractor::with_mode(mode);

    let mut found = 0usize;
    loop {
        let wire = match extractor.extract(&mut buffer) {
            Some(wire) => Some(wire),
            // Nothing more will arrive; resolve what is left.
            None if args.all => extractor.finish(&mut buffer),
            None => None,
        };
        let Some(frame) = wire.as_deref().and_then(decode_frame) else {
            break;
        };

        print_frame(&frame, format);
        found += 1;
        if !args.all {
            break;
        }
    }
    debug!(found, buffered = buffer.len(), "extraction finished");

    if found == 0 {
        return Err(CliError::new(FAILURE, "no valid frame found"));
    }
    Ok(SUCCESS)
}

fn read_input(args: &ExtractArgs) -> CliResult<Vec<u8>> {
    let bytes = match &args.input {
        Some(path) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|err| io_error("failed reading stdin", err))?;
            bytes
        }
    };

    if args.raw_input {
        return Ok(bytes);
    }
    let text = String::from_utf8(bytes)
        .map_err(|_| CliError::new(USAGE, "input is not hex text; use --raw-input"))?;
    decode_hex("input", &text)
}
