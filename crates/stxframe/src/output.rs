use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stxframe_frame::Frame;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    addr: u8,
    cmd: u8,
    checksum: u8,
    payload_size: usize,
    payload_hex: String,
    payload_text: Option<String>,
    wire_size: usize,
    wire_hex: String,
}

impl FrameOutput {
    fn new(frame: &Frame) -> Self {
        let wire = frame.to_wire();
        Self {
            addr: frame.addr,
            cmd: frame.cmd,
            checksum: frame.checksum(),
            payload_size: frame.payload.len(),
            payload_hex: hex::encode(&frame.payload),
            payload_text: printable_text(&frame.payload),
            wire_size: wire.len(),
            wire_hex: hex::encode(&wire),
        }
    }
}

#[derive(Serialize)]
struct VerifyOutput {
    valid: bool,
    input_size: usize,
    frame: Option<FrameOutput>,
}

/// Print a decoded frame. `Raw` writes the payload bytes.
pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new(frame)),
        OutputFormat::Table => println!("{}", frame_table(frame)),
        OutputFormat::Pretty => {
            println!(
                "addr=0x{:02X} cmd=0x{:02X} crc=0x{:02X} size={} payload={}",
                frame.addr,
                frame.cmd,
                frame.checksum(),
                frame.payload.len(),
                payload_preview(&frame.payload)
            );
        }
        OutputFormat::Raw => print_raw(&frame.payload),
    }
}

/// Print a freshly built frame. `Raw` writes the wire bytes.
pub fn print_wire(frame: &Frame, format: OutputFormat) {
    let wire = frame.to_wire();
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new(frame)),
        OutputFormat::Table => {
            let mut table = frame_table(frame);
            table.add_row(vec![
                "WIRE".to_string(),
                format!("{} bytes", wire.len()),
                String::new(),
                String::new(),
                spaced_hex(&wire),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(&wire)),
        OutputFormat::Raw => print_raw(&wire),
    }
}

/// Print the outcome of verifying `input`.
pub fn print_verdict(input: &[u8], frame: Option<&Frame>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&VerifyOutput {
            valid: frame.is_some(),
            input_size: input.len(),
            frame: frame.map(FrameOutput::new),
        }),
        OutputFormat::Raw => {
            if let Some(frame) = frame {
                print_raw(&frame.payload);
            }
        }
        OutputFormat::Table | OutputFormat::Pretty => match frame {
            Some(frame) => {
                println!("valid");
                print_frame(frame, format);
            }
            None => println!("invalid ({} bytes)", input.len()),
        },
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn frame_table(frame: &Frame) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ADDR", "CMD", "CRC", "SIZE", "PAYLOAD"])
        .add_row(vec![
            format!("0x{:02X}", frame.addr),
            format!("0x{:02X}", frame.cmd),
            format!("0x{:02X}", frame.checksum()),
            frame.payload.len().to_string(),
            payload_preview(&frame.payload),
        ]);
    table
}

pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn printable_text(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    if text.chars().all(|c| !c.is_control() || c.is_whitespace()) {
        Some(text.to_string())
    } else {
        None
    }
}

fn payload_preview(payload: &[u8]) -> String {
    match printable_text(payload) {
        Some(text) => text,
        None => spaced_hex(payload),
    }
}
