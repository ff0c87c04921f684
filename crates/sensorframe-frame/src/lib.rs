//! Frame synchronization and integrity checks for serial sensor streams.
//!
//! Bytes arrive one at a time from a [`ByteSource`](sensorframe_transport::ByteSource)
//! with no framing guarantees. A [`FrameDecoder`] hunts for the sync pattern,
//! walks the header described by a [`ProtocolDescriptor`], collects the
//! payload, and validates the trailer. [`FrameReader`] bounds each acquisition
//! call to a fixed number of byte reads.
//!
//! Two formats are built in:
//! - [`IMU`]: 38-byte packets with an additive checksum
//! - [`GPS`]: variable-length receiver logs with a CRC-32 trailer

pub mod accumulator;
pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod logs;
pub mod reader;
pub mod writer;

pub use accumulator::{merge_le, FieldAccumulator};
pub use checksum::{additive_sum, crc32, crc32_value, ChecksumKind, ChecksumStatus, CRC32_POLYNOMIAL};
pub use codec::{
    encode_frame, encode_gps_frame, encode_imu_frame, wire_size, Frame, GpsLogHeader, HeaderFields,
};
pub use decoder::{DecoderState, DecoderStats, FrameDecoder, ResyncReason, Stage, Step};
pub use descriptor::{MismatchPolicy, Protocol, ProtocolDescriptor, GPS, IMU};
pub use error::{FrameError, Result};
pub use logs::log_name;
pub use reader::{AcquisitionConfig, FrameReader, DEFAULT_READ_TIMEOUT};
pub use writer::FrameWriter;
