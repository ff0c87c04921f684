//! Byte-at-a-time frame synchronizer.
//!
//! [`FrameDecoder`] is one generic state machine driven by a
//! [`ProtocolDescriptor`]. Every call to [`FrameDecoder::step`] consumes a
//! single byte and moves through four stages:
//!
//! ```text
//!  Sync ──(pattern matched)──▶ Header ──(header_len reached)──▶ Payload
//!   ▲                            │                                │
//!   │  constant mismatch,        │                                │ payload_len bytes
//!   │  zero/oversize length      │                                ▼
//!   └────────────────────────────┴──────(trailer consumed)──── Trailer
//! ```
//!
//! The decoder owns one fixed-capacity [`Frame`] buffer and never allocates
//! after construction. It performs no I/O, so it can be exercised directly
//! with byte slices; see [`crate::reader`] for the bounded acquisition loop.

use tracing::{debug, warn};

use crate::accumulator::FieldAccumulator;
use crate::checksum::ChecksumStatus;
use crate::codec::Frame;
use crate::descriptor::{
    FieldKind, HeaderField, MismatchPolicy, PayloadLength, ProtocolDescriptor, GPS, IMU,
};

/// Position of the decoder inside a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Sync,
    Header,
    Payload,
    Trailer,
}

/// Cursor into the frame being assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderState {
    pub stage: Stage,
    /// Offset of the next field (or next sync byte) inside the frame.
    pub byte_index: usize,
    accumulator: FieldAccumulator,
    payload_len: usize,
}

impl DecoderState {
    /// Position inside the multi-byte field currently being assembled.
    pub fn sub_index(&self) -> usize {
        self.accumulator.sub_index()
    }

    /// Payload length of the frame in progress (known from the Payload stage on).
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }
}

/// Why the decoder dropped a partial frame and went back to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReason {
    /// A partially matched sync pattern was broken.
    SyncLost,
    /// A constant header byte had the wrong value.
    HeaderConstant { offset: usize, expected: u8, found: u8 },
    /// The message length field was zero.
    ZeroLength,
    /// The message length would overflow the frame buffer.
    LengthOverflow { length: usize, max: usize },
    /// The descriptor has no field at this header offset.
    UnmappedOffset(usize),
}

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More bytes are needed.
    Pending,
    /// The partial frame was abandoned; the decoder is back in sync search.
    Resync(ResyncReason),
    /// A frame is complete and available from [`FrameDecoder::completed`].
    Ready,
    /// The trailer did not match and the frame was discarded.
    Rejected(ChecksumStatus),
}

/// Running counters for one decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Bytes fed through [`FrameDecoder::step`].
    pub bytes: u64,
    /// Frames handed out (including flagged CRC mismatches).
    pub frames: u64,
    /// Bytes skipped while searching for sync.
    pub noise_bytes: u64,
    /// Partial frames abandoned for any [`ResyncReason`].
    pub resyncs: u64,
    /// Trailer comparisons that failed.
    pub checksum_failures: u64,
    /// Frames dropped because of a trailer mismatch.
    pub discarded: u64,
}

/// Streaming decoder for one wire format.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    descriptor: ProtocolDescriptor,
    state: DecoderState,
    frame: Frame,
    ready: bool,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder for `descriptor`, allocating its frame buffer.
    pub fn new(descriptor: ProtocolDescriptor) -> Self {
        debug_assert!(!descriptor.sync.is_empty(), "empty sync pattern");
        debug_assert!(descriptor.header_len <= descriptor.capacity);
        Self {
            frame: Frame::for_descriptor(&descriptor),
            descriptor,
            state: DecoderState::default(),
            ready: false,
            stats: DecoderStats::default(),
        }
    }

    /// Decoder for the 38-byte IMU packet.
    pub fn imu() -> Self {
        Self::new(IMU)
    }

    /// Decoder for GPS binary logs.
    pub fn gps() -> Self {
        Self::new(GPS)
    }

    pub fn descriptor(&self) -> &ProtocolDescriptor {
        &self.descriptor
    }

    /// Current cursor.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// The frame completed by the most recent [`step`](Self::step), if any.
    ///
    /// Cleared by the next call to `step`.
    pub fn completed(&self) -> Option<&Frame> {
        self.ready.then_some(&self.frame)
    }

    /// Drop any partial frame and return to sync search.
    pub fn reset(&mut self) {
        self.state = DecoderState::default();
        self.ready = false;
    }

    /// Consume one byte.
    pub fn step(&mut self, byte: u8) -> Step {
        self.ready = false;
        self.stats.bytes += 1;
        match self.state.stage {
            Stage::Sync => self.step_sync(byte),
            Stage::Header => self.step_header(byte),
            Stage::Payload => self.step_payload(byte),
            Stage::Trailer => self.step_trailer(byte),
        }
    }

    fn step_sync(&mut self, byte: u8) -> Step {
        if self.accept_sync(byte) {
            return Step::Pending;
        }

        if self.state.byte_index == 0 {
            self.stats.noise_bytes += 1;
            return Step::Pending;
        }

        self.resync(byte, ResyncReason::SyncLost)
    }

    fn step_header(&mut self, byte: u8) -> Step {
        let offset = self.state.byte_index;
        let Some(spec) = self.descriptor.field_at(offset).copied() else {
            return self.resync(byte, ResyncReason::UnmappedOffset(offset));
        };

        match spec.kind {
            FieldKind::Constant(expected) => {
                if byte != expected {
                    return self.resync(
                        byte,
                        ResyncReason::HeaderConstant {
                            offset,
                            expected,
                            found: byte,
                        },
                    );
                }
                self.frame.buffer_mut()[offset] = byte;
                self.state.byte_index += 1;
            }
            FieldKind::PassThrough => {
                self.frame.buffer_mut()[offset] = byte;
                self.state.byte_index += 1;
            }
            FieldKind::Accumulate { width, field } => {
                let Some(value) =
                    self.state
                        .accumulator
                        .push(self.frame.buffer_mut(), offset, width, byte)
                else {
                    return Step::Pending;
                };

                if field == HeaderField::MessageLength {
                    if let Err(reason) = self.check_length(value) {
                        return self.resync(byte, reason);
                    }
                }

                self.frame.header_mut().set(field, value);
                self.state.byte_index += width;
            }
            FieldKind::Skip { width } => {
                // Skipped bytes are not kept; zero them so stale data never
                // leaks into the frame or its CRC.
                let sub = self.state.accumulator.sub_index();
                self.frame.buffer_mut()[offset + sub] = 0;
                if !self.state.accumulator.skip(width) {
                    return Step::Pending;
                }
                self.state.byte_index += width;
            }
        }

        if self.state.byte_index >= self.descriptor.header_len {
            self.enter_payload();
        }
        Step::Pending
    }

    fn step_payload(&mut self, byte: u8) -> Step {
        let base = self.state.byte_index;
        let len = self.state.payload_len;
        if self
            .state
            .accumulator
            .copy(self.frame.buffer_mut(), base, len, byte)
        {
            self.state.byte_index += len;
            self.state.stage = Stage::Trailer;
        }
        Step::Pending
    }

    fn step_trailer(&mut self, byte: u8) -> Step {
        let base = self.state.byte_index;
        let width = self.descriptor.trailer_len();
        let Some(received) = self
            .state
            .accumulator
            .push(self.frame.buffer_mut(), base, width, byte)
        else {
            return Step::Pending;
        };

        let kind = self.descriptor.checksum;
        let computed = kind.compute(&self.frame.buffer()[..base]);
        let status = ChecksumStatus {
            computed,
            received,
            matched: kind.matches(computed, received),
        };

        // Trailer completion always ends the frame, whatever the outcome.
        self.state = DecoderState::default();

        if !status.matched {
            self.stats.checksum_failures += 1;
            if self.descriptor.on_mismatch == MismatchPolicy::Discard {
                self.stats.discarded += 1;
                debug!(
                    protocol = %self.descriptor.protocol,
                    check = kind.name(),
                    computed = format_args!("{:#010x}", status.computed),
                    received = format_args!("{:#010x}", status.received),
                    "frame discarded on checksum mismatch"
                );
                return Step::Rejected(status);
            }
            warn!(
                protocol = %self.descriptor.protocol,
                check = kind.name(),
                expected = format_args!("{:#010x}", kind.expected_trailer(status.computed)),
                received = format_args!("{:#010x}", status.received),
                "checksum mismatch; frame reported anyway"
            );
        }

        self.frame.complete(base + width, status);
        self.ready = true;
        self.stats.frames += 1;
        Step::Ready
    }

    /// Match `byte` against the next sync byte; store it on success.
    fn accept_sync(&mut self, byte: u8) -> bool {
        let index = self.state.byte_index;
        if byte != self.descriptor.sync[index] {
            return false;
        }

        self.frame.buffer_mut()[index] = byte;
        self.state.byte_index += 1;
        if self.state.byte_index == self.descriptor.sync.len() {
            self.state.stage = Stage::Header;
        }
        true
    }

    fn check_length(&self, value: u32) -> Result<(), ResyncReason> {
        let length = value as usize;
        let max = self.descriptor.max_payload();
        if length == 0 {
            Err(ResyncReason::ZeroLength)
        } else if length > max {
            Err(ResyncReason::LengthOverflow { length, max })
        } else {
            Ok(())
        }
    }

    fn enter_payload(&mut self) {
        let len = match self.descriptor.payload {
            PayloadLength::Fixed(len) => len,
            PayloadLength::FromHeader => usize::from(self.frame.header().message_length),
        };
        self.state.payload_len = len;
        self.state.stage = if len == 0 {
            Stage::Trailer
        } else {
            Stage::Payload
        };
    }

    fn resync(&mut self, byte: u8, reason: ResyncReason) -> Step {
        self.stats.resyncs += 1;
        debug!(protocol = %self.descriptor.protocol, ?reason, "frame resync");

        self.state = DecoderState::default();
        // The byte that broke this frame may open the next one.
        self.accept_sync(byte);
        Step::Resync(reason)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::checksum::crc32;
    use crate::codec::{encode_gps_frame, encode_imu_frame, GpsLogHeader};
    use crate::descriptor::gps;

    fn imu_payload() -> Vec<u8> {
        (0..30u8).map(|i| i.wrapping_mul(13).wrapping_add(5)).collect()
    }

    fn imu_wire() -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_imu_frame(&imu_payload(), &mut buf).unwrap();
        buf.to_vec()
    }

    fn gps_header() -> GpsLogHeader {
        GpsLogHeader {
            message_id: 241,
            message_type: 0x02,
            port_address: 0x20,
            sequence_number: 0x0102,
            idle_time: 0x7F,
            time_status: 180,
            time_week: 2034,
            time_ms: 0x1234_5678,
            receiver_status: 0x8000_0001,
            sw_version: 0x3344,
        }
    }

    fn gps_wire(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_gps_frame(&gps_header(), payload, &mut buf).unwrap();
        buf.to_vec()
    }

    /// Feed every byte, returning a copy of each completed frame.
    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &b in bytes {
            if decoder.step(b) == Step::Ready {
                frames.push(decoder.completed().unwrap().as_bytes().to_vec());
            }
        }
        frames
    }

    #[test]
    fn canonical_imu_frame_on_first_attempt() {
        let wire = imu_wire();
        let mut decoder = FrameDecoder::imu();

        let (last, head) = wire.split_last().unwrap();
        for &b in head {
            assert_eq!(decoder.step(b), Step::Pending);
        }
        assert_eq!(decoder.step(*last), Step::Ready);

        let frame = decoder.completed().unwrap();
        assert_eq!(frame.len(), 38);
        assert_eq!(frame.as_bytes(), wire.as_slice());
        assert_eq!(frame.payload(), imu_payload().as_slice());
        assert!(frame.checksum().matched);
        assert_eq!(decoder.state(), DecoderState::default());
    }

    #[test]
    fn imu_recovers_after_noise() {
        let wire = imu_wire();
        for noise_len in 1..=50usize {
            let mut stream: Vec<u8> = (0..noise_len)
                .map(|i| match (i as u8).wrapping_mul(37).wrapping_add(11) {
                    0xFF => 0x00,
                    b => b,
                })
                .collect();
            stream.extend_from_slice(&wire);

            let mut decoder = FrameDecoder::imu();
            let frames = decode_all(&mut decoder, &stream);
            assert_eq!(frames, vec![wire.clone()], "noise length {noise_len}");
            assert_eq!(decoder.stats().noise_bytes, noise_len as u64);
        }
    }

    #[test]
    fn imu_single_payload_flip_is_rejected() {
        let wire = imu_wire();
        for pos in 7..37 {
            let mut corrupted = wire.clone();
            corrupted[pos] ^= 0xA5;

            let mut decoder = FrameDecoder::imu();
            let steps: Vec<Step> = corrupted.iter().map(|&b| decoder.step(b)).collect();

            assert!(matches!(steps.last(), Some(Step::Rejected(s)) if !s.matched), "pos {pos}");
            assert!(decoder.completed().is_none());
            assert_eq!(decoder.stats().discarded, 1);
            assert_eq!(decoder.stats().frames, 0);
        }
    }

    #[test]
    fn imu_header_constant_mismatch_resets() {
        let mut wire = imu_wire();
        wire[6] = 0x15;

        let mut decoder = FrameDecoder::imu();
        let steps: Vec<Step> = wire[..7].iter().map(|&b| decoder.step(b)).collect();

        assert_eq!(
            steps[6],
            Step::Resync(ResyncReason::HeaderConstant {
                offset: 6,
                expected: 0x14,
                found: 0x15
            })
        );
        assert_eq!(decoder.state().stage, Stage::Sync);
        assert_eq!(decoder.state().byte_index, 0);
    }

    #[test]
    fn imu_recovers_from_broken_sync_prefix() {
        let mut stream = vec![0xFF, 0xFF, 0x00];
        stream.extend_from_slice(&imu_wire());

        let mut decoder = FrameDecoder::imu();
        let frames = decode_all(&mut decoder, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.stats().resyncs, 1);
    }

    #[test]
    fn back_to_back_imu_frames() {
        let wire = imu_wire();
        let stream = [wire.as_slice(), &wire, &wire].concat();

        let mut decoder = FrameDecoder::imu();
        assert_eq!(decode_all(&mut decoder, &stream).len(), 3);
        assert_eq!(decoder.stats().frames, 3);
        assert_eq!(decoder.stats().bytes, 3 * 38);
    }

    #[test]
    fn broken_sync_prefix_is_a_resync() {
        let mut decoder = FrameDecoder::gps();
        assert_eq!(decoder.step(0xAA), Step::Pending);
        assert_eq!(decoder.step(0x44), Step::Pending);
        assert_eq!(decoder.step(0x00), Step::Resync(ResyncReason::SyncLost));
        assert_eq!(decoder.state(), DecoderState::default());
    }

    #[test]
    fn sync_mismatch_byte_is_reevaluated() {
        // "AA AA 44 12" must sync on the second AA.
        let mut decoder = FrameDecoder::gps();
        decoder.step(0xAA);
        assert_eq!(decoder.step(0xAA), Step::Resync(ResyncReason::SyncLost));
        assert_eq!(decoder.state().byte_index, 1);
        decoder.step(0x44);
        decoder.step(0x12);
        assert_eq!(decoder.state().stage, Stage::Header);
    }

    #[test]
    fn gps_frame_fields_are_decoded() {
        let payload: Vec<u8> = (0..112u8).collect();
        let wire = gps_wire(&payload);
        let mut decoder = FrameDecoder::gps();

        let frames = decode_all(&mut decoder, &wire);
        assert_eq!(frames, vec![wire.clone()]);

        let frame = decoder.completed().unwrap();
        let header = frame.header();
        assert_eq!(header.message_id, 241);
        assert_eq!(header.message_length, 112);
        assert_eq!(header.sequence_number, 0x0102);
        assert_eq!(header.time_week, 2034);
        assert_eq!(header.time_ms, 0x1234_5678);
        assert_eq!(header.status, 0x8000_0001);
        assert_eq!(header.sw_version, 0x3344);
        assert_eq!(frame.as_bytes()[gps::MESSAGE_TYPE], 0x02);
        assert_eq!(frame.as_bytes()[gps::TIME_STATUS], 180);
        assert_eq!(frame.payload(), payload.as_slice());
        assert_eq!(frame.len(), 28 + 112 + 4);
        assert!(frame.checksum().matched);
    }

    #[test]
    fn gps_multibyte_fields_track_sub_index() {
        let wire = gps_wire(b"payload");
        let mut decoder = FrameDecoder::gps();
        for &b in &wire[..gps::TIME_MS + 2] {
            decoder.step(b);
        }

        let state = decoder.state();
        assert_eq!(state.stage, Stage::Header);
        assert_eq!(state.byte_index, gps::TIME_MS);
        assert_eq!(state.sub_index(), 2);
    }

    #[test]
    fn gps_zero_length_never_leaves_header() {
        let mut wire = gps_wire(b"abcd");
        wire[gps::MESSAGE_LENGTH] = 0;
        wire[gps::MESSAGE_LENGTH + 1] = 0;
        let trailing: Vec<u8> = (0..=255u8).filter(|&b| b != 0xAA).collect();
        wire.extend_from_slice(&trailing);

        let mut decoder = FrameDecoder::gps();
        for (i, &b) in wire.iter().enumerate() {
            let step = decoder.step(b);
            if i == gps::MESSAGE_LENGTH + 1 {
                assert_eq!(step, Step::Resync(ResyncReason::ZeroLength));
            }
            assert!(
                matches!(decoder.state().stage, Stage::Sync | Stage::Header),
                "byte {i} reached {:?}",
                decoder.state().stage
            );
        }
        assert_eq!(decoder.stats().frames, 0);
    }

    #[test]
    fn gps_oversized_length_resyncs() {
        let mut wire = gps_wire(b"abcd");
        wire[gps::MESSAGE_LENGTH..gps::MESSAGE_LENGTH + 2].copy_from_slice(&469u16.to_le_bytes());

        let mut decoder = FrameDecoder::gps();
        let steps: Vec<Step> = wire[..10].iter().map(|&b| decoder.step(b)).collect();
        assert_eq!(
            steps[9],
            Step::Resync(ResyncReason::LengthOverflow {
                length: 469,
                max: 468
            })
        );
    }

    #[test]
    fn gps_bad_header_length_resyncs() {
        let mut wire = gps_wire(b"abcd");
        wire[3] = 0x1D;

        let mut decoder = FrameDecoder::gps();
        let steps: Vec<Step> = wire[..4].iter().map(|&b| decoder.step(b)).collect();
        assert!(matches!(
            steps[3],
            Step::Resync(ResyncReason::HeaderConstant { offset: 3, .. })
        ));
    }

    #[test]
    fn gps_crc_mismatch_is_reported_ready() {
        let mut wire = gps_wire(b"position");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let mut decoder = FrameDecoder::gps();
        let frames = decode_all(&mut decoder, &wire);
        assert_eq!(frames.len(), 1);

        let status = decoder.completed().unwrap().checksum();
        assert!(!status.matched);
        assert_eq!(status.computed, crc32(0, &wire[..wire.len() - 4]));
        assert_eq!(decoder.stats().checksum_failures, 1);
        assert_eq!(decoder.stats().discarded, 0);
    }

    #[test]
    fn gps_crc_mismatch_rejected_under_strict_policy() {
        let mut wire = gps_wire(b"position");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let mut decoder = FrameDecoder::new(GPS.with_mismatch_policy(MismatchPolicy::Discard));
        let steps: Vec<Step> = wire.iter().map(|&b| decoder.step(b)).collect();
        assert!(matches!(steps.last(), Some(Step::Rejected(_))));
        assert!(decoder.completed().is_none());
    }

    #[test]
    fn gps_unswapped_crc_trailer_is_flagged() {
        // A trailer carrying the CRC in plain little-endian order does not
        // match the byte-reversed comparison.
        let mut wire = gps_wire(b"position");
        let body = wire.len() - 4;
        let crc = crc32(0, &wire[..body]);
        wire[body..].copy_from_slice(&crc.to_le_bytes());

        let mut decoder = FrameDecoder::gps();
        decode_all(&mut decoder, &wire);
        let status = decoder.completed().unwrap().checksum();
        assert_eq!(status.received, crc);
        assert!(!status.matched);
    }

    #[test]
    fn reserved_bytes_are_not_kept() {
        let mut wire = gps_wire(b"abc");
        wire[gps::RESERVED] = 0xDE;
        wire[gps::RESERVED + 1] = 0xAD;

        let mut decoder = FrameDecoder::gps();
        decode_all(&mut decoder, &wire);
        let frame = decoder.completed().unwrap();
        assert_eq!(&frame.as_bytes()[gps::RESERVED..gps::RESERVED + 2], &[0, 0]);
        // The CRC was computed over the zeroed region, so it still matches.
        assert!(frame.checksum().matched);
    }

    #[test]
    fn completed_frame_clears_on_next_byte() {
        let wire = imu_wire();
        let mut decoder = FrameDecoder::imu();
        decode_all(&mut decoder, &wire);
        assert!(decoder.completed().is_some());
        decoder.step(0x00);
        assert!(decoder.completed().is_none());
    }

    #[test]
    fn refeeding_after_reset_matches_fresh_decoder() {
        let wire = gps_wire(b"xy");
        let mut used = FrameDecoder::gps();
        for &b in &wire[..20] {
            used.step(b);
        }
        used.reset();

        let mut fresh = FrameDecoder::gps();
        for &b in &wire {
            assert_eq!(used.step(b), fresh.step(b));
            assert_eq!(used.state(), fresh.state());
        }
    }
}
