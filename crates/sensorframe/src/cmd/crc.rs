use serde::Serialize;
use sensorframe_frame::{crc32, ChecksumKind};

use crate::cmd::CrcArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct CrcOutput {
    schema_id: &'static str,
    length: usize,
    crc32: String,
    trailer: String,
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let data = match (&args.hex, &args.file) {
        (Some(hex), _) => decode_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "one of --hex or --file is required")),
    };

    let crc = crc32(0, &data);
    let out = CrcOutput {
        schema_id: "https://schemas.3leaps.dev/sensorframe/cli/v1/crc.schema.json",
        length: data.len(),
        crc32: format!("{crc:08x}"),
        trailer: format!("{:08x}", ChecksumKind::Crc32Reflected.expected_trailer(crc)),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("CRC-32:");
            println!("  Length:   {}", out.length);
            println!("  Value:    {}", out.crc32);
            println!("  Trailer:  {}", out.trailer);
        }
        OutputFormat::Raw => println!("{}", out.crc32),
    }
    Ok(SUCCESS)
}

fn decode_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(DATA_INVALID, "hex input has an odd number of digits"));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(CliError::new(
                DATA_INVALID,
                format!("invalid hex digits: {}", String::from_utf8_lossy(pair)),
            )),
        })
        .collect()
}

fn nibble(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|value| value as u8)
}
