//! Byte-at-a-time transport abstraction for serial sensors.
//!
//! Sensor links deliver an unframed byte stream. Decoders in
//! `sensorframe-frame` pull from it one byte at a time through
//! [`ByteSource`], and device configuration pushes ASCII commands through
//! [`CommandSink`]. Implementations provided here:
//! - [`StreamPort`] over any `Read + Write` (files, sockets, test cursors)
//! - [`SerialPort`] over a physical serial device (behind `serial` feature)
//!
//! This is the lowest layer of sensorframe. Everything else builds on top of
//! these two traits.

pub mod error;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{ByteSource, CommandSink, StreamPort};

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialPort};
