use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSource, CommandSink};

/// Serial link settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (`/dev/ttyUSB0`, `COM3`).
    pub path: String,
    /// Line rate in bits per second.
    pub baud_rate: u32,
    /// Initial read/write timeout applied at open.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Default line rate for the nano IMU.
    pub const IMU_BAUD_RATE: u32 = 115_200;
    /// Default line rate for the GPS receiver COM port.
    pub const GPS_BAUD_RATE: u32 = 9_600;
    /// Default per-byte timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Settings for `path` at `baud_rate` with the default timeout.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Serial port transport.
///
/// Wraps an 8N1 serial device. The per-call timeout passed to
/// [`ByteSource::read_byte`] is applied to the port before each read when it
/// differs from the one currently set.
pub struct SerialPort {
    port: Box<dyn serialport::SerialPort>,
    path: String,
    timeout: Duration,
}

impl SerialPort {
    /// Open the serial device described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|err| TransportError::Open {
                path: config.path.clone(),
                reason: err.to_string(),
            })?;

        info!(path = %config.path, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            path: config.path.clone(),
            timeout: config.timeout,
        })
    }

    /// The device path this port was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }

    fn apply_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout != self.timeout {
            self.port
                .set_timeout(timeout)
                .map_err(|err| TransportError::Io(err.into()))?;
            debug!(path = %self.path, ?timeout, "serial timeout changed");
            self.timeout = timeout;
        }
        Ok(())
    }
}

impl ByteSource for SerialPort {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        self.apply_timeout(timeout)?;

        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    return Err(TransportError::Timeout(timeout))
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl CommandSink for SerialPort {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes).map_err(|err| {
            if err.kind() == ErrorKind::TimedOut {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Io(err)
            }
        })?;
        self.port.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
