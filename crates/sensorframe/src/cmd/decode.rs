use std::fs::File;
use std::io::BufReader;

use sensorframe_frame::{FrameError, FrameReader};
use sensorframe_transport::{StreamPort, TransportError};
use tracing::info;

use crate::cmd::{descriptor_for, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("open {}", args.file.display()), err))?;
    let descriptor = descriptor_for(args.protocol, args.strict_crc);
    let mut reader = FrameReader::new(StreamPort::new(BufReader::new(file)), descriptor);

    let mut printed = 0u64;
    while args.count.is_none_or(|count| printed < count) {
        match reader.read_frame() {
            Ok(Some(frame)) => {
                print_frame(printed, frame, format);
                printed += 1;
            }
            // Budget spent on noise; a capture file just keeps going.
            Ok(None) => continue,
            Err(FrameError::Transport(TransportError::Closed)) => break,
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    let stats = reader.stats();
    print_stats(descriptor.protocol, &stats, format);
    info!(
        file = %args.file.display(),
        frames = stats.frames,
        resyncs = stats.resyncs,
        "decode finished"
    );

    if printed == 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no {} frames found in {}", descriptor.protocol, args.file.display()),
        ));
    }
    Ok(SUCCESS)
}
