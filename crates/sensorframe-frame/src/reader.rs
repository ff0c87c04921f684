use std::time::Duration;

use sensorframe_transport::ByteSource;
use tracing::debug;

use crate::codec::Frame;
use crate::decoder::{DecoderStats, FrameDecoder, Step};
use crate::descriptor::{ProtocolDescriptor, GPS, IMU};
use crate::error::Result;

/// Default per-byte read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Bounds for one acquisition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Maximum byte reads per call before giving up.
    pub max_bytes: usize,
    /// Timeout handed to every [`ByteSource::read_byte`].
    pub read_timeout: Duration,
}

impl AcquisitionConfig {
    /// Defaults for a wire format: its byte budget and the default timeout.
    pub fn for_descriptor(descriptor: &ProtocolDescriptor) -> Self {
        Self {
            max_bytes: descriptor.max_bytes,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Pulls bytes from a [`ByteSource`] until a frame completes or the budget runs out.
///
/// The reader owns one [`FrameDecoder`], so decoder state carries over between
/// calls: a frame cut off by the budget is finished by the next call.
pub struct FrameReader<S> {
    source: S,
    decoder: FrameDecoder,
    config: AcquisitionConfig,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a reader with the descriptor's default configuration.
    pub fn new(source: S, descriptor: ProtocolDescriptor) -> Self {
        let config = AcquisitionConfig::for_descriptor(&descriptor);
        Self::with_config(source, descriptor, config)
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(source: S, descriptor: ProtocolDescriptor, config: AcquisitionConfig) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(descriptor),
            config,
        }
    }

    /// Reader for IMU packets with default configuration.
    pub fn imu(source: S) -> Self {
        Self::new(source, IMU)
    }

    /// Reader for GPS logs with default configuration.
    pub fn gps(source: S) -> Self {
        Self::new(source, GPS)
    }

    /// Read bytes until the next frame completes (blocking).
    ///
    /// Returns `Ok(None)` once `max_bytes` reads passed without a complete
    /// frame. Any transport error, including a read timeout, ends the call
    /// and is returned as-is; the decoder keeps its position either way.
    pub fn read_frame(&mut self) -> Result<Option<&Frame>> {
        for _ in 0..self.config.max_bytes {
            let byte = self.source.read_byte(self.config.read_timeout)?;
            if self.decoder.step(byte) == Step::Ready {
                return Ok(self.decoder.completed());
            }
        }

        debug!(
            protocol = %self.decoder.descriptor().protocol,
            budget = self.config.max_bytes,
            stage = ?self.decoder.state().stage,
            "acquisition budget exhausted"
        );
        Ok(None)
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// The decoder driven by this reader.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Decoder counters.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Update the byte budget for subsequent calls.
    pub fn set_max_bytes(&mut self, max_bytes: usize) {
        self.config.max_bytes = max_bytes;
    }

    /// Current acquisition configuration.
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }
}
