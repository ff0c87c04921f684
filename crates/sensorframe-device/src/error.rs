/// Errors that can occur while driving a sensor device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] sensorframe_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] sensorframe_frame::FrameError),

    /// The command cannot be sent as a single ASCII line.
    #[error("invalid command {command:?}: {reason}")]
    InvalidCommand {
        command: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, DeviceError>;
