use bytes::{BufMut, BytesMut};

use crate::checksum::{additive_sum, crc32, ChecksumKind, ChecksumStatus};
use crate::descriptor::{gps, imu, HeaderField, Protocol, ProtocolDescriptor, GPS, IMU};
use crate::error::{FrameError, Result};

/// Scalar header fields decoded while a frame is assembled.
///
/// Only the GPS format carries these; for IMU frames they stay zero. Values
/// are meaningful once the frame has left the header stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub message_id: u16,
    pub message_length: u16,
    pub sequence_number: u16,
    pub time_week: u16,
    pub time_ms: u32,
    pub status: u32,
    pub sw_version: u16,
}

impl HeaderFields {
    pub(crate) fn set(&mut self, field: HeaderField, value: u32) {
        // Widths come from the descriptor, so narrowing never drops bits.
        match field {
            HeaderField::MessageId => self.message_id = value as u16,
            HeaderField::MessageLength => self.message_length = value as u16,
            HeaderField::SequenceNumber => self.sequence_number = value as u16,
            HeaderField::TimeWeek => self.time_week = value as u16,
            HeaderField::TimeMs => self.time_ms = value,
            HeaderField::ReceiverStatus => self.status = value,
            HeaderField::SoftwareVersion => self.sw_version = value as u16,
        }
    }
}

/// A decoded wire frame held in a fixed-capacity buffer.
///
/// The buffer is allocated once, when the owning decoder is built, and
/// reused for every frame after that.
#[derive(Debug, Clone)]
pub struct Frame {
    protocol: Protocol,
    raw: Box<[u8]>,
    len: usize,
    header_len: usize,
    trailer_len: usize,
    header: HeaderFields,
    checksum: ChecksumStatus,
}

impl Frame {
    /// An empty frame sized for `descriptor`.
    pub fn for_descriptor(descriptor: &ProtocolDescriptor) -> Self {
        Self {
            protocol: descriptor.protocol,
            raw: vec![0u8; descriptor.capacity].into_boxed_slice(),
            len: 0,
            header_len: descriptor.header_len,
            trailer_len: descriptor.trailer_len(),
            header: HeaderFields::default(),
            checksum: ChecksumStatus::default(),
        }
    }

    /// Wire format of this frame.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The complete frame as received: sync, header, payload, trailer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw[..self.len]
    }

    /// Payload bytes between header and trailer.
    pub fn payload(&self) -> &[u8] {
        if self.len < self.header_len + self.trailer_len {
            return &[];
        }
        &self.raw[self.header_len..self.len - self.trailer_len]
    }

    /// Bytes filled by the last completed frame.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True until a frame has been completed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed buffer capacity.
    pub fn capacity(&self) -> usize {
        self.raw.len()
    }

    /// Decoded header scalars.
    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    /// Trailer comparison recorded when the frame completed.
    pub fn checksum(&self) -> ChecksumStatus {
        self.checksum
    }

    pub(crate) fn buffer(&self) -> &[u8] {
        &self.raw
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.raw
    }

    pub(crate) fn header_mut(&mut self) -> &mut HeaderFields {
        &mut self.header
    }

    pub(crate) fn complete(&mut self, len: usize, checksum: ChecksumStatus) {
        debug_assert!(len <= self.raw.len());
        self.len = len;
        self.checksum = checksum;
    }
}

/// Header values for building a GPS binary log frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpsLogHeader {
    pub message_id: u16,
    pub message_type: u8,
    pub port_address: u8,
    pub sequence_number: u16,
    pub idle_time: u8,
    pub time_status: u8,
    pub time_week: u16,
    pub time_ms: u32,
    pub receiver_status: u32,
    pub sw_version: u16,
}

/// Encode an IMU packet.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────┬──────┬──────┬────────────────┬──────────┐
/// │ Sync (4B)    │ Size │ Dev  │ Msg  │ Payload (30B)  │ Sum (1B) │
/// │ FF FF FF FF  │ 0x26 │ 0xFF │ 0x14 │                │ mod 256  │
/// └──────────────┴──────┴──────┴──────┴────────────────┴──────────┘
/// ```
pub fn encode_imu_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() != imu::PAYLOAD_LEN {
        return Err(FrameError::PayloadLength {
            size: payload.len(),
            expected: imu::PAYLOAD_LEN,
        });
    }

    let start = dst.len();
    dst.reserve(imu::FRAME_LEN);
    dst.put_slice(&imu::SYNC);
    dst.put_u8(imu::MESSAGE_SIZE);
    dst.put_u8(imu::DEVICE_ID);
    dst.put_u8(imu::MESSAGE_ID);
    dst.put_slice(payload);
    let sum = additive_sum(&dst[start..]);
    dst.put_u8(sum);
    Ok(())
}

/// Encode a GPS binary log.
///
/// Wire format:
/// ```text
/// ┌───────────┬─────┬──────────────────────────┬──────────────┬──────────┐
/// │ Sync (3B) │ 28  │ Header fields (24B, LE)  │ Payload (n)  │ CRC (4B) │
/// │ AA 44 12  │     │ length n at offset 8     │              │          │
/// └───────────┴─────┴──────────────────────────┴──────────────┴──────────┘
/// ```
///
/// The reserved bytes are written as zero. The CRC trailer is emitted in the
/// byte order the decoder accepts as a match.
pub fn encode_gps_frame(header: &GpsLogHeader, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }
    if payload.len() > GPS.max_payload() {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: GPS.max_payload(),
        });
    }

    let start = dst.len();
    dst.reserve(GPS.frame_len(payload.len()));
    dst.put_slice(&gps::SYNC);
    dst.put_u8(gps::HEADER_LEN as u8);
    dst.put_u16_le(header.message_id);
    dst.put_u8(header.message_type);
    dst.put_u8(header.port_address);
    dst.put_u16_le(payload.len() as u16);
    dst.put_u16_le(header.sequence_number);
    dst.put_u8(header.idle_time);
    dst.put_u8(header.time_status);
    dst.put_u16_le(header.time_week);
    dst.put_u32_le(header.time_ms);
    dst.put_u32_le(header.receiver_status);
    dst.put_u16_le(0);
    dst.put_u16_le(header.sw_version);
    dst.put_slice(payload);
    let crc = crc32(0, &dst[start..]);
    dst.put_u32_le(ChecksumKind::Crc32Reflected.expected_trailer(crc));
    Ok(())
}

/// Encode a frame for `protocol` with a default header.
///
/// Convenience for simulators and fixtures that only care about payloads.
pub fn encode_frame(protocol: Protocol, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    match protocol {
        Protocol::Imu => encode_imu_frame(payload, dst),
        Protocol::Gps => encode_gps_frame(&GpsLogHeader::default(), payload, dst),
    }
}

/// Wire size of a frame for `protocol` carrying `payload_len` bytes.
pub fn wire_size(protocol: Protocol, payload_len: usize) -> usize {
    match protocol {
        Protocol::Imu => IMU.frame_len(imu::PAYLOAD_LEN),
        Protocol::Gps => GPS.frame_len(payload_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imu_frame_layout() {
        let payload: Vec<u8> = (0..30).collect();
        let mut buf = BytesMut::new();
        encode_imu_frame(&payload, &mut buf).unwrap();

        assert_eq!(buf.len(), 38);
        assert_eq!(&buf[..7], &[0xFF, 0xFF, 0xFF, 0xFF, 0x26, 0xFF, 0x14]);
        assert_eq!(&buf[7..37], payload.as_slice());
        assert_eq!(buf[37], additive_sum(&buf[..37]));
    }

    #[test]
    fn imu_rejects_wrong_payload_size() {
        let mut buf = BytesMut::new();
        let err = encode_imu_frame(&[0u8; 29], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadLength {
                size: 29,
                expected: 30
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn gps_frame_layout() {
        let header = GpsLogHeader {
            message_id: 241,
            sequence_number: 7,
            time_week: 2034,
            time_ms: 345_600_000,
            receiver_status: 0x0004_0000,
            sw_version: 0x1234,
            ..GpsLogHeader::default()
        };
        let mut buf = BytesMut::new();
        encode_gps_frame(&header, b"xyz", &mut buf).unwrap();

        assert_eq!(buf.len(), 28 + 3 + 4);
        assert_eq!(&buf[..4], &[0xAA, 0x44, 0x12, 0x1C]);
        assert_eq!(&buf[4..6], &241u16.to_le_bytes());
        assert_eq!(&buf[8..10], &3u16.to_le_bytes());
        assert_eq!(&buf[16..20], &345_600_000u32.to_le_bytes());
        assert_eq!(&buf[24..26], &[0, 0]);
        assert_eq!(&buf[28..31], b"xyz");

        let crc = crc32(0, &buf[..31]);
        let trailer = u32::from_le_bytes([buf[31], buf[32], buf[33], buf[34]]);
        assert_eq!(trailer, crc.swap_bytes());
    }

    #[test]
    fn gps_rejects_empty_and_oversized_payloads() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_gps_frame(&GpsLogHeader::default(), b"", &mut buf),
            Err(FrameError::EmptyPayload)
        ));
        let big = vec![0u8; 469];
        assert!(matches!(
            encode_gps_frame(&GpsLogHeader::default(), &big, &mut buf),
            Err(FrameError::PayloadTooLarge { size: 469, max: 468 })
        ));
    }

    #[test]
    fn appends_after_existing_bytes() {
        let mut buf = BytesMut::from(&[0x00, 0x01][..]);
        encode_frame(Protocol::Imu, &[0u8; 30], &mut buf).unwrap();
        assert_eq!(buf.len(), 2 + 38);
        assert_eq!(buf[39], additive_sum(&buf[2..39]));
    }

    #[test]
    fn wire_sizes() {
        assert_eq!(wire_size(Protocol::Imu, 0), 38);
        assert_eq!(wire_size(Protocol::Gps, 100), 132);
    }

    #[test]
    fn empty_frame_has_no_payload() {
        let frame = Frame::for_descriptor(&GPS);
        assert!(frame.is_empty());
        assert_eq!(frame.capacity(), 500);
        assert!(frame.payload().is_empty());
        assert_eq!(frame.header(), &HeaderFields::default());
    }
}
