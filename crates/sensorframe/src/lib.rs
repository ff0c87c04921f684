//! Frame synchronization and decoding for serial IMU and GPS sensors.
//!
//! Sensors on a UART deliver frames with no transport-level framing. sensorframe
//! finds frame boundaries byte by byte, validates each frame's integrity
//! trailer, and recovers from noise and truncation.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-at-a-time sources and command sinks (streams, serial ports)
//! - [`frame`]: descriptor-driven frame decoder, checksums, bounded acquisition loop
//! - [`device`]: GPS receiver and IMU wrappers (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use sensorframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sensorframe_frame::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use sensorframe_device::*;
}
