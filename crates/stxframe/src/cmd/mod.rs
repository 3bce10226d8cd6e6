use clap::{Args, Subcommand};
use std::path::PathBuf;

use stxframe_frame::DEFAULT_BUFFER_CAPACITY;

use crate::exit::{hex_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod build;
pub mod extract;
pub mod listen;
pub mod verify;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a wire frame.
    Build(BuildArgs),
    /// Verify a wire frame given as hex.
    Verify(VerifyArgs),
    /// Recover the first valid frame from a noisy byte stream.
    Extract(ExtractArgs),
    /// Read and print frames from a file, FIFO or serial device.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Build(args) => build::run(args, format),
        Command::Verify(args) => verify::run(args, format),
        Command::Extract(args) => extract::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Destination address (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_byte)]
    pub addr: u8,
    /// Command code (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_byte)]
    pub cmd: u8,
    /// Payload as hex.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Payload as a UTF-8 string.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["hex", "data"])]
    pub file: Option<PathBuf>,
    /// Refuse frames larger than this many wire bytes.
    #[arg(long, env = "STXFRAME_BUFFER_CAPACITY", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub max_frame_size: usize,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Wire frame as hex (whitespace allowed).
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Input file. Default: stdin.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
    /// Treat input as raw bytes instead of hex text.
    #[arg(long)]
    pub raw_input: bool,
    /// Stream buffer capacity; older bytes are evicted.
    #[arg(long, env = "STXFRAME_BUFFER_CAPACITY", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub capacity: usize,
    /// Keep unconsumed bytes in the buffer after extraction.
    #[arg(long)]
    pub retain: bool,
    /// Print every recoverable frame, not just the first.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// File, FIFO or device node to read from.
    pub path: PathBuf,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Stream buffer capacity.
    #[arg(long, env = "STXFRAME_BUFFER_CAPACITY", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub capacity: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5`, `0x05` or `0X05` as a byte.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => input.parse::<u8>(),
    };
    parsed.map_err(|err| format!("invalid byte value {input:?}: {err}"))
}

/// Decode hex text, ignoring ASCII whitespace.
pub fn decode_hex(what: &str, input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if digits.is_empty() {
        return Err(CliError::new(USAGE, format!("{what} must not be empty")));
    }
    hex::decode(&digits).map_err(|err| hex_error(what, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_accepts_decimal_and_hex() {
        assert_eq!(parse_byte("5"), Ok(5));
        assert_eq!(parse_byte("0x1B"), Ok(0x1B));
        assert_eq!(parse_byte("0Xff"), Ok(0xFF));
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0x").is_err());
    }

    #[test]
    fn decode_hex_ignores_whitespace() {
        assert_eq!(decode_hex("frame", "02 05\n10 31 03").unwrap(), vec![0x02, 0x05, 0x10, 0x31, 0x03]);
        assert_eq!(decode_hex("frame", "").unwrap_err().code, USAGE);
        assert_eq!(decode_hex("frame", "0g").unwrap_err().code, USAGE);
        assert_eq!(decode_hex("frame", "123").unwrap_err().code, USAGE);
    }
}
