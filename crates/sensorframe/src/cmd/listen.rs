use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sensorframe_device::{DeviceError, GpsReceiver, Imu, ReceiverConfig};
use sensorframe_frame::{AcquisitionConfig, DecoderStats, Frame, FrameError, Protocol};
use sensorframe_transport::{SerialConfig, SerialPort};
use tracing::{debug, info};

use crate::cmd::{descriptor_for, parse_duration, ListenArgs, ProtocolArg};
use crate::exit::{device_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

/// A device that yields frames from the acquisition loop.
trait FrameSource {
    fn next_frame(&mut self) -> sensorframe_device::Result<Option<&Frame>>;
    fn stats(&self) -> DecoderStats;
}

impl FrameSource for Imu<SerialPort> {
    fn next_frame(&mut self) -> sensorframe_device::Result<Option<&Frame>> {
        self.read_frame()
    }

    fn stats(&self) -> DecoderStats {
        Imu::stats(self)
    }
}

impl FrameSource for GpsReceiver<SerialPort> {
    fn next_frame(&mut self) -> sensorframe_device::Result<Option<&Frame>> {
        self.read_frame()
    }

    fn stats(&self) -> DecoderStats {
        GpsReceiver::stats(self)
    }
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let baud_rate = args.baud.unwrap_or(match args.protocol {
        ProtocolArg::Imu => SerialConfig::IMU_BAUD_RATE,
        ProtocolArg::Gps => SerialConfig::GPS_BAUD_RATE,
    });
    let serial = SerialConfig {
        timeout,
        ..SerialConfig::new(&args.port, baud_rate)
    };
    let port = SerialPort::open(&serial).map_err(|err| transport_error("open failed", err))?;

    let descriptor = descriptor_for(args.protocol, args.strict_crc);
    let acquisition = AcquisitionConfig {
        read_timeout: timeout,
        ..AcquisitionConfig::for_descriptor(&descriptor)
    };

    let mut source: Box<dyn FrameSource> = match args.protocol {
        ProtocolArg::Imu => Box::new(Imu::with_config(port, acquisition)),
        ProtocolArg::Gps => {
            let config = ReceiverConfig {
                set_approx_time: args.approx_time,
                on_mismatch: descriptor.on_mismatch,
                ..ReceiverConfig::default()
            };
            let mut receiver = GpsReceiver::with_acquisition(
                port,
                config,
                sensorframe_device::SystemClock,
                acquisition,
            );
            if args.configure {
                receiver
                    .configure()
                    .map_err(|err| device_error("configure failed", err))?;
            }
            Box::new(receiver)
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0u64;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }

        match source.next_frame() {
            Ok(Some(frame)) => {
                print_frame(printed, frame, format);
                printed += 1;
            }
            Ok(None) => debug!("no frame within acquisition budget"),
            // A quiet line is not fatal to the session; Ctrl-C ends it.
            Err(DeviceError::Frame(FrameError::Transport(err))) if err.is_timeout() => {
                debug!("read timed out, retrying");
            }
            Err(err) => return Err(device_error("receive failed", err)),
        }
    }

    let protocol = Protocol::from(args.protocol);
    print_stats(protocol, &source.stats(), format);
    info!(port = %args.port, frames = printed, "listen finished");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
