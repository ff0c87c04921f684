//! Device wrappers for serial sensors.
//!
//! [`GpsReceiver`] configures a receiver with ASCII commands and then reads
//! binary logs; [`Imu`] only reads packets. Both sit on top of the frame
//! acquisition loop in `sensorframe-frame`.

pub mod command;
pub mod error;
pub mod gps_time;
pub mod imu;
pub mod receiver;

pub use command::{CommandConfig, CommandWriter, DEFAULT_INTER_BYTE_DELAY};
pub use error::{DeviceError, Result};
pub use gps_time::{approx_gps_time, Clock, GpsTime, SystemClock, GPS_EPOCH_UNIX, SECONDS_PER_WEEK};
pub use imu::Imu;
pub use receiver::{ApproxPosition, GpsReceiver, ReceiverConfig};
