use sensorframe_frame::{AcquisitionConfig, DecoderStats, Frame, FrameReader, IMU};
use sensorframe_transport::ByteSource;

use crate::error::Result;

/// An IMU streaming fixed-size packets. The device takes no commands.
pub struct Imu<S> {
    reader: FrameReader<S>,
}

impl<S: ByteSource> Imu<S> {
    /// Create an IMU reader with the default 100-byte budget.
    pub fn new(source: S) -> Self {
        Self {
            reader: FrameReader::imu(source),
        }
    }

    /// Create an IMU reader with explicit acquisition bounds.
    pub fn with_config(source: S, config: AcquisitionConfig) -> Self {
        Self {
            reader: FrameReader::with_config(source, IMU, config),
        }
    }

    /// Acquire the next packet with a valid checksum.
    pub fn read_frame(&mut self) -> Result<Option<&Frame>> {
        Ok(self.reader.read_frame()?)
    }

    /// Decoder counters.
    pub fn stats(&self) -> DecoderStats {
        self.reader.stats()
    }

    /// The acquisition loop driving this device.
    pub fn reader(&self) -> &FrameReader<S> {
        &self.reader
    }

    /// Consume the device and return the source.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use sensorframe_frame::encode_imu_frame;
    use sensorframe_transport::StreamPort;

    use super::*;

    #[test]
    fn reads_packets_through_noise() {
        let mut wire = BytesMut::from(&[0x00, 0x13, 0xFF, 0x7E][..]);
        encode_imu_frame(&[0x5A; 30], &mut wire).unwrap();

        let mut imu = Imu::new(StreamPort::new(Cursor::new(wire.to_vec())));
        let frame = imu.read_frame().unwrap().unwrap();
        assert_eq!(frame.payload(), &[0x5A; 30]);
        assert!(frame.checksum().matched);
        assert_eq!(imu.reader().config().max_bytes, 100);
    }

    #[test]
    fn small_budget_returns_none() {
        let mut wire = BytesMut::new();
        encode_imu_frame(&[1; 30], &mut wire).unwrap();
        let config = AcquisitionConfig {
            max_bytes: 10,
            ..AcquisitionConfig::for_descriptor(&IMU)
        };

        let mut imu = Imu::with_config(StreamPort::new(Cursor::new(wire.to_vec())), config);
        assert!(imu.read_frame().unwrap().is_none());
        assert_eq!(imu.stats().frames, 0);
        assert_eq!(imu.into_inner().get_ref().position(), 10);
    }
}
