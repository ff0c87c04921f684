mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sensorframe", version, about = "Serial sensor frame decoder")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "SENSORFRAME_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "SENSORFRAME_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ProtocolArg;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "sensorframe",
            "decode",
            "/tmp/capture.bin",
            "--protocol",
            "gps",
            "--count",
            "3",
            "--strict-crc",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.protocol, ProtocolArg::Gps);
                assert_eq!(args.count, Some(3));
                assert!(args.strict_crc);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn crc_requires_exactly_one_input() {
        let err = Cli::try_parse_from(["sensorframe", "crc"]).expect_err("missing input");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from([
            "sensorframe",
            "crc",
            "--hex",
            "00",
            "--file",
            "/tmp/x",
        ])
        .expect_err("conflicting inputs");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn approx_time_requires_configure() {
        let err = Cli::try_parse_from([
            "sensorframe",
            "listen",
            "/dev/ttyUSB0",
            "--protocol",
            "gps",
            "--approx-time",
        ])
        .expect_err("--approx-time without --configure");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_listen_with_global_format() {
        let cli = Cli::try_parse_from([
            "sensorframe",
            "listen",
            "/dev/ttyUSB0",
            "-p",
            "imu",
            "--timeout",
            "250ms",
            "--format",
            "pretty",
        ])
        .expect("listen args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        assert!(matches!(cli.command, Command::Listen(_)));
    }

    #[test]
    fn synth_requires_output() {
        let err = Cli::try_parse_from(["sensorframe", "synth", "--protocol", "imu"])
            .expect_err("missing --output");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
