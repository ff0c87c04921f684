use std::fs::File;
use std::io::BufWriter;

use bytes::BytesMut;
use sensorframe_frame::logs::BESTXYZ;
use sensorframe_frame::{encode_gps_frame, encode_imu_frame, FrameWriter, GpsLogHeader, Protocol};
use tracing::info;

use crate::cmd::SynthArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

const IMU_PAYLOAD_LEN: usize = 30;
/// BESTXYZB body size.
const GPS_PAYLOAD_LEN: usize = 112;

pub fn run(args: SynthArgs) -> CliResult<i32> {
    let file = File::create(&args.output)
        .map_err(|err| io_error(&format!("create {}", args.output.display()), err))?;
    let protocol = Protocol::from(args.protocol);
    let mut writer = FrameWriter::new(BufWriter::new(file), protocol);
    let mut noise = Noise::new(args.seed, protocol.descriptor().sync[0]);
    let mut frame = BytesMut::new();

    for index in 0..args.count {
        let junk = noise.bytes(args.noise);
        writer
            .write_raw(&junk)
            .map_err(|err| frame_error("write failed", err))?;

        frame.clear();
        encode(protocol, index, &mut frame).map_err(|err| frame_error("encode failed", err))?;
        if args.corrupt_crc {
            if let Some(last) = frame.last_mut() {
                *last ^= 0xFF;
            }
        }
        writer
            .write_raw(&frame)
            .map_err(|err| frame_error("write failed", err))?;
    }
    writer.flush().map_err(|err| frame_error("flush failed", err))?;

    info!(
        output = %args.output.display(),
        protocol = %protocol,
        frames = args.count,
        noise = args.noise,
        corrupt = args.corrupt_crc,
        "synthetic capture written"
    );
    Ok(SUCCESS)
}

fn encode(protocol: Protocol, index: u64, dst: &mut BytesMut) -> sensorframe_frame::Result<()> {
    match protocol {
        Protocol::Imu => {
            let payload: Vec<u8> = (0..IMU_PAYLOAD_LEN)
                .map(|offset| (index as usize + offset) as u8)
                .collect();
            encode_imu_frame(&payload, dst)
        }
        Protocol::Gps => {
            let header = GpsLogHeader {
                message_id: BESTXYZ,
                sequence_number: index as u16,
                time_status: 180,
                time_week: 2300,
                time_ms: (index as u32).wrapping_mul(50),
                ..GpsLogHeader::default()
            };
            let payload: Vec<u8> = (0..GPS_PAYLOAD_LEN)
                .map(|offset| (index as usize * 7 + offset) as u8)
                .collect();
            encode_gps_frame(&header, &payload, dst)
        }
    }
}

/// Deterministic xorshift noise that never emits the first sync byte, so
/// noise cannot open a false frame.
struct Noise {
    state: u64,
    avoid: u8,
}

impl Noise {
    fn new(seed: u64, avoid: u8) -> Self {
        Self {
            state: seed.max(1),
            avoid,
        }
    }

    fn next_byte(&mut self) -> u8 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        let byte = (self.state >> 24) as u8;
        if byte == self.avoid {
            byte.wrapping_add(1)
        } else {
            byte
        }
    }

    fn bytes(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.next_byte()).collect()
    }
}
