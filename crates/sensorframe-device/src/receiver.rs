use std::fmt;

use sensorframe_frame::{
    AcquisitionConfig, DecoderStats, Frame, FrameReader, MismatchPolicy, GPS,
};
use sensorframe_transport::{ByteSource, CommandSink};
use tracing::{info, warn};

use crate::command::{CommandConfig, CommandWriter};
use crate::error::Result;
use crate::gps_time::{approx_gps_time, Clock, SystemClock};

/// Rough antenna position used to seed the receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxPosition {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Metres above mean sea level.
    pub height: f64,
}

impl ApproxPosition {
    pub const fn new(latitude: f64, longitude: f64, height: f64) -> Self {
        Self {
            latitude,
            longitude,
            height,
        }
    }

    /// The receiver command that seeds this position.
    pub fn command(&self) -> String {
        format!("SETAPPROXPOS {self}")
    }
}

impl Default for ApproxPosition {
    fn default() -> Self {
        Self::new(-15.765824, -47.872109, 1024.0)
    }
}

impl fmt::Display for ApproxPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.latitude, self.longitude, self.height)
    }
}

/// Startup configuration for a GPS receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverConfig {
    /// Position sent with `SETAPPROXPOS`, if any.
    pub approx_position: Option<ApproxPosition>,
    /// Log requests, each sent as `LOG <request>`.
    pub logs: Vec<String>,
    /// Send `SETAPPROXTIME` from the host clock first.
    pub set_approx_time: bool,
    /// Command pacing.
    pub command: CommandConfig,
    /// Trailer mismatch handling for received logs.
    pub on_mismatch: MismatchPolicy,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            approx_position: Some(ApproxPosition::default()),
            logs: vec!["BESTXYZB ONTIME 0.05".to_string()],
            set_approx_time: false,
            command: CommandConfig::default(),
            on_mismatch: GPS.on_mismatch,
        }
    }
}

/// A GPS receiver on a bidirectional port.
///
/// Commands go out through the same port the binary logs arrive on.
pub struct GpsReceiver<P, C = SystemClock> {
    reader: FrameReader<P>,
    clock: C,
    config: ReceiverConfig,
}

impl<P: ByteSource + CommandSink> GpsReceiver<P> {
    /// Create a receiver using the host clock.
    pub fn new(port: P, config: ReceiverConfig) -> Self {
        Self::with_clock(port, config, SystemClock)
    }
}

impl<P: ByteSource + CommandSink, C: Clock> GpsReceiver<P, C> {
    /// Create a receiver with an explicit time source.
    pub fn with_clock(port: P, config: ReceiverConfig, clock: C) -> Self {
        let descriptor = GPS.with_mismatch_policy(config.on_mismatch);
        Self {
            reader: FrameReader::new(port, descriptor),
            clock,
            config,
        }
    }

    /// Create a receiver with explicit acquisition bounds.
    pub fn with_acquisition(
        port: P,
        config: ReceiverConfig,
        clock: C,
        acquisition: AcquisitionConfig,
    ) -> Self {
        let descriptor = GPS.with_mismatch_policy(config.on_mismatch);
        Self {
            reader: FrameReader::with_config(port, descriptor, acquisition),
            clock,
            config,
        }
    }

    /// Commands [`configure`](Self::configure) would send, in order.
    ///
    /// The time command is left out when the clock has no usable time.
    pub fn command_sequence(&self) -> Vec<String> {
        let mut commands = Vec::with_capacity(self.config.logs.len() + 2);

        if self.config.set_approx_time {
            match self.clock.unix_time().and_then(approx_gps_time) {
                Some(time) => commands.push(time.command()),
                None => warn!("host clock has no usable time, skipping SETAPPROXTIME"),
            }
        }
        if let Some(position) = &self.config.approx_position {
            commands.push(position.command());
        }
        commands.extend(self.config.logs.iter().map(|log| format!("LOG {log}")));
        commands
    }

    /// Send the startup command sequence. Returns the number of commands sent.
    pub fn configure(&mut self) -> Result<usize> {
        let commands = self.command_sequence();
        let mut writer = CommandWriter::with_config(self.reader.get_mut(), self.config.command);
        for command in &commands {
            writer.send(command)?;
        }

        info!(commands = commands.len(), "gps receiver configured");
        Ok(commands.len())
    }

    /// Acquire the next binary log, bounded by the acquisition budget.
    pub fn read_frame(&mut self) -> Result<Option<&Frame>> {
        Ok(self.reader.read_frame()?)
    }

    /// Decoder counters.
    pub fn stats(&self) -> DecoderStats {
        self.reader.stats()
    }

    /// Receiver configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// The acquisition loop driving this receiver.
    pub fn reader(&self) -> &FrameReader<P> {
        &self.reader
    }

    /// Mutably borrow the acquisition loop.
    pub fn reader_mut(&mut self) -> &mut FrameReader<P> {
        &mut self.reader
    }

    /// Consume the receiver and return the port.
    pub fn into_inner(self) -> P {
        self.reader.into_inner()
    }
}
