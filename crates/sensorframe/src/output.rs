use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sensorframe_frame::{log_name, DecoderStats, Frame, Protocol};
use serde::Serialize;

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
struct ChecksumOutput {
    kind: &'static str,
    computed: String,
    expected: String,
    received: String,
    matched: bool,
}

#[derive(Serialize)]
struct FrameOutput {
    schema_id: &'static str,
    index: u64,
    protocol: &'static str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_week: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_ms: Option<u32>,
    payload_len: usize,
    payload: String,
    checksum: ChecksumOutput,
}

impl FrameOutput {
    fn new(index: u64, frame: &Frame) -> Self {
        let is_gps = frame.protocol() == Protocol::Gps;
        let header = frame.header();
        let checksum = frame.checksum();
        let kind = frame.protocol().descriptor().checksum;
        let hex_width = kind.trailer_len() * 2;

        Self {
            schema_id: "https://schemas.3leaps.dev/sensorframe/cli/v1/frame.schema.json",
            index,
            protocol: frame.protocol().name(),
            size: frame.len(),
            message_id: is_gps.then_some(header.message_id),
            message_name: is_gps.then(|| log_name(header.message_id)),
            sequence: is_gps.then_some(header.sequence_number),
            time_week: is_gps.then_some(header.time_week),
            time_ms: is_gps.then_some(header.time_ms),
            payload_len: frame.payload().len(),
            payload: hex(frame.payload()),
            checksum: ChecksumOutput {
                kind: kind.name(),
                computed: format!("{:0hex_width$x}", checksum.computed),
                expected: format!("{:0hex_width$x}", kind.expected_trailer(checksum.computed)),
                received: format!("{:0hex_width$x}", checksum.received),
                matched: checksum.matched,
            },
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    schema_id: &'static str,
    protocol: &'static str,
    bytes: u64,
    frames: u64,
    noise_bytes: u64,
    resyncs: u64,
    checksum_failures: u64,
    discarded: u64,
}

pub fn print_frame(index: u64, frame: &Frame, format: OutputFormat) {
    let out = FrameOutput::new(index, frame);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "PROTOCOL", "MESSAGE", "SIZE", "CHECKSUM", "PAYLOAD"])
                .add_row(vec![
                    out.index.to_string(),
                    out.protocol.to_string(),
                    message_label(&out),
                    out.size.to_string(),
                    checksum_label(&out.checksum),
                    preview(&out.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} {} msg={} size={} {}={} payload={}",
                out.index,
                out.protocol,
                message_label(&out),
                out.size,
                out.checksum.kind,
                checksum_label(&out.checksum),
                preview(&out.payload)
            );
        }
        OutputFormat::Raw => print_raw(frame.as_bytes()),
    }
}

pub fn print_stats(protocol: Protocol, stats: &DecoderStats, format: OutputFormat) {
    let out = StatsOutput {
        schema_id: "https://schemas.3leaps.dev/sensorframe/cli/v1/decoder-stats.schema.json",
        protocol: protocol.name(),
        bytes: stats.bytes,
        frames: stats.frames,
        noise_bytes: stats.noise_bytes,
        resyncs: stats.resyncs,
        checksum_failures: stats.checksum_failures,
        discarded: stats.discarded,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["BYTES", "FRAMES", "NOISE", "RESYNCS", "CRC FAIL", "DISCARDED"])
                .add_row(vec![
                    out.bytes.to_string(),
                    out.frames.to_string(),
                    out.noise_bytes.to_string(),
                    out.resyncs.to_string(),
                    out.checksum_failures.to_string(),
                    out.discarded.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: bytes={} frames={} noise={} resyncs={} checksum_failures={} discarded={}",
                out.protocol,
                out.bytes,
                out.frames,
                out.noise_bytes,
                out.resyncs,
                out.checksum_failures,
                out.discarded
            );
        }
        // Raw output is frame bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn message_label(out: &FrameOutput) -> String {
    match (out.message_name, out.message_id, out.sequence) {
        (Some(name), Some(id), Some(seq)) => format!("{name} ({id}) seq={seq}"),
        _ => "-".to_string(),
    }
}

fn checksum_label(checksum: &ChecksumOutput) -> String {
    if checksum.matched {
        format!("ok {}", checksum.received)
    } else {
        format!("MISMATCH {} != {}", checksum.received, checksum.expected)
    }
}

fn preview(payload_hex: &str) -> String {
    const PREVIEW_CHARS: usize = 32;
    if payload_hex.len() <= PREVIEW_CHARS {
        payload_hex.to_string()
    } else {
        format!("{}...", &payload_hex[..PREVIEW_CHARS])
    }
}
