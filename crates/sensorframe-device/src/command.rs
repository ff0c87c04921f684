use std::thread;
use std::time::Duration;

use sensorframe_transport::CommandSink;
use tracing::{debug, trace};

use crate::error::{DeviceError, Result};

/// Pause after every byte written, including the line terminator.
pub const DEFAULT_INTER_BYTE_DELAY: Duration = Duration::from_millis(5);

/// Pacing for ASCII command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandConfig {
    /// Sleep inserted after each byte. Zero disables pacing.
    pub inter_byte_delay: Duration,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            inter_byte_delay: DEFAULT_INTER_BYTE_DELAY,
        }
    }
}

/// Sends ASCII commands one byte at a time, each terminated by CR LF.
///
/// Receivers with small UART buffers drop characters that arrive back to
/// back, hence the per-byte writes.
pub struct CommandWriter<S> {
    sink: S,
    config: CommandConfig,
}

impl<S: CommandSink> CommandWriter<S> {
    /// Create a writer with the default 5 ms pacing.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, CommandConfig::default())
    }

    /// Create a writer with explicit pacing.
    pub fn with_config(sink: S, config: CommandConfig) -> Self {
        Self { sink, config }
    }

    /// Send `command` followed by `\r\n`.
    ///
    /// The command is validated before anything is written.
    pub fn send(&mut self, command: &str) -> Result<()> {
        validate_command(command)?;
        debug!(command, "sending device command");

        for &byte in command.as_bytes().iter().chain(b"\r\n") {
            trace!(byte, "command byte");
            self.sink.write_bytes(&[byte])?;
            if !self.config.inter_byte_delay.is_zero() {
                thread::sleep(self.config.inter_byte_delay);
            }
        }
        Ok(())
    }

    /// Current pacing configuration.
    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

fn validate_command(command: &str) -> Result<()> {
    let reason = if command.is_empty() {
        "command is empty"
    } else if !command.is_ascii() {
        "command must be ASCII"
    } else if command.contains(['\r', '\n']) {
        "command must not contain line terminators"
    } else {
        return Ok(());
    };

    Err(DeviceError::InvalidCommand {
        command: command.to_string(),
        reason,
    })
}
