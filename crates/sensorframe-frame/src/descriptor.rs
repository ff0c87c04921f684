//! Wire-format tables driving the generic frame decoder.
//!
//! A [`ProtocolDescriptor`] is constant data: the sync pattern, what to do
//! with each header offset, where the payload length comes from, and which
//! integrity check guards the frame. [`IMU`] and [`GPS`] are the two built-in
//! formats.

use crate::checksum::ChecksumKind;

/// Decoded header scalars a descriptor may accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    MessageId,
    MessageLength,
    SequenceNumber,
    TimeWeek,
    TimeMs,
    ReceiverStatus,
    SoftwareVersion,
}

/// What the decoder does with the bytes at one header offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The byte must equal this value, otherwise the frame is abandoned.
    Constant(u8),
    /// One byte copied as-is.
    PassThrough,
    /// A little-endian integer of `width` bytes.
    Accumulate { width: usize, field: HeaderField },
    /// `width` bytes consumed but not kept.
    Skip { width: usize },
}

/// One header field at a fixed frame offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(offset: usize, kind: FieldKind) -> Self {
        Self { offset, kind }
    }

    /// Number of bytes this field spans.
    pub const fn width(&self) -> usize {
        match self.kind {
            FieldKind::Constant(_) | FieldKind::PassThrough => 1,
            FieldKind::Accumulate { width, .. } | FieldKind::Skip { width } => width,
        }
    }
}

/// Where the payload length of a frame comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLength {
    /// Every frame carries exactly this many payload bytes.
    Fixed(usize),
    /// The header's [`HeaderField::MessageLength`] gives the count.
    FromHeader,
}

/// What happens to a frame whose trailer does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Drop the frame; the caller never sees it.
    Discard,
    /// Hand the frame out anyway with the mismatch recorded on it.
    Report,
}

/// Supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Imu,
    Gps,
}

impl Protocol {
    /// The built-in descriptor for this format.
    pub fn descriptor(self) -> ProtocolDescriptor {
        match self {
            Protocol::Imu => IMU,
            Protocol::Gps => GPS,
        }
    }

    /// Lowercase name for diagnostics and output.
    pub fn name(self) -> &'static str {
        match self {
            Protocol::Imu => "imu",
            Protocol::Gps => "gps",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Constant description of one wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    pub protocol: Protocol,
    /// Pattern opening every frame.
    pub sync: &'static [u8],
    /// Header fields after the sync pattern, contiguous and in offset order.
    pub header: &'static [FieldSpec],
    /// Bytes from frame start to first payload byte (sync included).
    pub header_len: usize,
    pub payload: PayloadLength,
    pub checksum: ChecksumKind,
    /// Largest complete frame the buffer holds.
    pub capacity: usize,
    /// Default number of byte reads per acquisition call.
    pub max_bytes: usize,
    pub on_mismatch: MismatchPolicy,
}

impl ProtocolDescriptor {
    /// Same format with a different trailer-mismatch policy.
    pub const fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.on_mismatch = policy;
        self
    }

    /// Header field starting at `offset`.
    pub fn field_at(&self, offset: usize) -> Option<&FieldSpec> {
        self.header.iter().find(|spec| spec.offset == offset)
    }

    /// Trailer width in bytes.
    pub const fn trailer_len(&self) -> usize {
        self.checksum.trailer_len()
    }

    /// Largest payload that still fits the frame buffer.
    pub const fn max_payload(&self) -> usize {
        self.capacity - self.header_len - self.trailer_len()
    }

    /// Total wire size of a frame with `payload_len` payload bytes.
    pub const fn frame_len(&self, payload_len: usize) -> usize {
        self.header_len + payload_len + self.trailer_len()
    }
}

/// Nano IMU packet layout.
pub mod imu {
    /// Four `0xFF` bytes open each packet.
    pub const SYNC: [u8; 4] = [0xFF; 4];
    /// Message size byte at offset 4 (the full packet length).
    pub const MESSAGE_SIZE: u8 = 0x26;
    /// Device id byte at offset 5.
    pub const DEVICE_ID: u8 = 0xFF;
    /// Message id byte at offset 6.
    pub const MESSAGE_ID: u8 = 0x14;

    pub const HEADER_LEN: usize = 7;
    pub const FRAME_LEN: usize = 38;
    pub const PAYLOAD_LEN: usize = FRAME_LEN - HEADER_LEN - 1;
    pub const MAX_BYTES: usize = 100;
}

/// Receiver binary log layout (3 sync + 25 header + payload + 4 CRC).
pub mod gps {
    pub const SYNC: [u8; 3] = [0xAA, 0x44, 0x12];
    /// Header length byte at offset 3.
    pub const HEADER_LEN: usize = 28;

    pub const MESSAGE_ID: usize = 4;
    pub const MESSAGE_TYPE: usize = 6;
    pub const PORT_ADDRESS: usize = 7;
    pub const MESSAGE_LENGTH: usize = 8;
    pub const SEQUENCE: usize = 10;
    pub const IDLE_TIME: usize = 12;
    pub const TIME_STATUS: usize = 13;
    pub const TIME_WEEK: usize = 14;
    pub const TIME_MS: usize = 16;
    pub const RECEIVER_STATUS: usize = 20;
    pub const RESERVED: usize = 24;
    pub const SOFTWARE_VERSION: usize = 26;

    pub const CAPACITY: usize = 500;
    pub const MAX_BYTES: usize = 1000;
}

const IMU_HEADER: [FieldSpec; 3] = [
    FieldSpec::new(4, FieldKind::Constant(imu::MESSAGE_SIZE)),
    FieldSpec::new(5, FieldKind::Constant(imu::DEVICE_ID)),
    FieldSpec::new(6, FieldKind::Constant(imu::MESSAGE_ID)),
];

const GPS_HEADER: [FieldSpec; 13] = [
    FieldSpec::new(3, FieldKind::Constant(gps::HEADER_LEN as u8)),
    FieldSpec::new(
        gps::MESSAGE_ID,
        FieldKind::Accumulate {
            width: 2,
            field: HeaderField::MessageId,
        },
    ),
    FieldSpec::new(gps::MESSAGE_TYPE, FieldKind::PassThrough),
    FieldSpec::new(gps::PORT_ADDRESS, FieldKind::PassThrough),
    FieldSpec::new(
        gps::MESSAGE_LENGTH,
        FieldKind::Accumulate {
            width: 2,
            field: HeaderField::MessageLength,
        },
    ),
    FieldSpec::new(
        gps::SEQUENCE,
        FieldKind::Accumulate {
            width: 2,
            field: HeaderField::SequenceNumber,
        },
    ),
    FieldSpec::new(gps::IDLE_TIME, FieldKind::PassThrough),
    FieldSpec::new(gps::TIME_STATUS, FieldKind::PassThrough),
    FieldSpec::new(
        gps::TIME_WEEK,
        FieldKind::Accumulate {
            width: 2,
            field: HeaderField::TimeWeek,
        },
    ),
    FieldSpec::new(
        gps::TIME_MS,
        FieldKind::Accumulate {
            width: 4,
            field: HeaderField::TimeMs,
        },
    ),
    FieldSpec::new(
        gps::RECEIVER_STATUS,
        FieldKind::Accumulate {
            width: 4,
            field: HeaderField::ReceiverStatus,
        },
    ),
    FieldSpec::new(gps::RESERVED, FieldKind::Skip { width: 2 }),
    FieldSpec::new(
        gps::SOFTWARE_VERSION,
        FieldKind::Accumulate {
            width: 2,
            field: HeaderField::SoftwareVersion,
        },
    ),
];

/// Fixed-size inertial packet with an additive checksum.
pub const IMU: ProtocolDescriptor = ProtocolDescriptor {
    protocol: Protocol::Imu,
    sync: &imu::SYNC,
    header: &IMU_HEADER,
    header_len: imu::HEADER_LEN,
    payload: PayloadLength::Fixed(imu::PAYLOAD_LEN),
    checksum: ChecksumKind::AdditiveSum,
    capacity: imu::FRAME_LEN,
    max_bytes: imu::MAX_BYTES,
    on_mismatch: MismatchPolicy::Discard,
};

/// Variable-length receiver log with a CRC-32 trailer.
///
/// Frames with a CRC mismatch are still handed out, flagged on
/// [`Frame::checksum`](crate::Frame::checksum).
pub const GPS: ProtocolDescriptor = ProtocolDescriptor {
    protocol: Protocol::Gps,
    sync: &gps::SYNC,
    header: &GPS_HEADER,
    header_len: gps::HEADER_LEN,
    payload: PayloadLength::FromHeader,
    checksum: ChecksumKind::Crc32Reflected,
    capacity: gps::CAPACITY,
    max_bytes: gps::MAX_BYTES,
    on_mismatch: MismatchPolicy::Report,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(desc: &ProtocolDescriptor) {
        let mut offset = desc.sync.len();
        for spec in desc.header {
            assert_eq!(spec.offset, offset, "{} header gap", desc.protocol);
            offset += spec.width();
        }
        assert_eq!(offset, desc.header_len, "{} header length", desc.protocol);
    }

    #[test]
    fn header_tables_are_contiguous() {
        assert_contiguous(&IMU);
        assert_contiguous(&GPS);
    }

    #[test]
    fn imu_layout() {
        assert_eq!(IMU.frame_len(imu::PAYLOAD_LEN), 38);
        assert_eq!(IMU.max_payload(), 30);
        assert_eq!(IMU.trailer_len(), 1);
        assert_eq!(IMU.max_bytes, 100);
        assert_eq!(IMU.on_mismatch, MismatchPolicy::Discard);
    }

    #[test]
    fn gps_layout() {
        assert_eq!(GPS.sync, &[0xAA, 0x44, 0x12]);
        assert_eq!(GPS.max_payload(), 500 - 28 - 4);
        assert_eq!(GPS.max_bytes, 1000);
        assert_eq!(GPS.on_mismatch, MismatchPolicy::Report);
        assert_eq!(
            GPS.field_at(gps::RESERVED).map(|s| s.kind),
            Some(FieldKind::Skip { width: 2 })
        );
        assert!(GPS.field_at(gps::MESSAGE_ID + 1).is_none());
    }

    #[test]
    fn mismatch_policy_override() {
        let strict = GPS.with_mismatch_policy(MismatchPolicy::Discard);
        assert_eq!(strict.on_mismatch, MismatchPolicy::Discard);
        assert_eq!(strict.header, GPS.header);
    }

    #[test]
    fn protocol_lookup() {
        assert_eq!(Protocol::Imu.descriptor(), IMU);
        assert_eq!(Protocol::Gps.to_string(), "gps");
    }
}
