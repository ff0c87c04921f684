use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand, ValueEnum};
use sensorframe_frame::{MismatchPolicy, Protocol, ProtocolDescriptor};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod listen;
pub mod synth;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode frames from a capture file.
    Decode(DecodeArgs),
    /// Read frames from a serial port.
    Listen(ListenArgs),
    /// Compute the receiver CRC-32 of some bytes.
    Crc(CrcArgs),
    /// Write synthetic frames to a capture file.
    Synth(SynthArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Crc(args) => crc::run(args, format),
        Command::Synth(args) => synth::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Wire format selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Imu,
    Gps,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Imu => Protocol::Imu,
            ProtocolArg::Gps => Protocol::Gps,
        }
    }
}

/// Descriptor for `protocol`, with `--strict-crc` applied.
pub fn descriptor_for(protocol: ProtocolArg, strict_crc: bool) -> ProtocolDescriptor {
    let descriptor = Protocol::from(protocol).descriptor();
    if strict_crc {
        descriptor.with_mismatch_policy(MismatchPolicy::Discard)
    } else {
        descriptor
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file holding raw sensor bytes.
    pub file: PathBuf,
    /// Wire format of the capture.
    #[arg(long, short = 'p', env = "SENSORFRAME_PROTOCOL")]
    pub protocol: ProtocolArg,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Drop GPS logs whose CRC does not match instead of reporting them.
    #[arg(long)]
    pub strict_crc: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    pub port: String,
    /// Wire format on the port.
    #[arg(long, short = 'p', env = "SENSORFRAME_PROTOCOL")]
    pub protocol: ProtocolArg,
    /// Baud rate. Default: 115200 for IMU, 9600 for GPS.
    #[arg(long, env = "SENSORFRAME_BAUD")]
    pub baud: Option<u32>,
    /// Per-byte read timeout (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
    /// Exit after N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Send the GPS receiver startup commands before reading.
    #[arg(long)]
    pub configure: bool,
    /// Include SETAPPROXTIME from the host clock when configuring.
    #[arg(long, requires = "configure")]
    pub approx_time: bool,
    /// Drop GPS logs whose CRC does not match instead of reporting them.
    #[arg(long)]
    pub strict_crc: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["hex", "file"])))]
pub struct CrcArgs {
    /// Input bytes as hex (whitespace allowed).
    #[arg(long)]
    pub hex: Option<String>,
    /// Read input bytes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Wire format to generate.
    #[arg(long, short = 'p')]
    pub protocol: ProtocolArg,
    /// Number of frames.
    #[arg(long, default_value = "10")]
    pub count: u64,
    /// Noise bytes written before each frame.
    #[arg(long, default_value = "0")]
    pub noise: usize,
    /// Corrupt the trailer of every frame.
    #[arg(long)]
    pub corrupt_crc: bool,
    /// Seed for noise generation.
    #[arg(long, default_value = "1")]
    pub seed: u64,
    /// Capture file to write.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s`, or bare seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0ms").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn strict_crc_only_changes_policy() {
        let strict = descriptor_for(ProtocolArg::Gps, true);
        assert_eq!(strict.on_mismatch, MismatchPolicy::Discard);
        assert_eq!(descriptor_for(ProtocolArg::Gps, false).on_mismatch, MismatchPolicy::Report);
        assert_eq!(descriptor_for(ProtocolArg::Imu, false).protocol, Protocol::Imu);
    }
}
