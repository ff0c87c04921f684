use sensorframe_transport::TransportError;

/// Errors that can occur during frame acquisition or encoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source failed; the acquisition call is abandoned.
    #[error("transport failed during acquisition: {0}")]
    Transport(#[from] TransportError),

    /// The payload exceeds what the frame buffer can hold.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A fixed-size payload has the wrong length.
    #[error("payload must be exactly {expected} bytes (got {size})")]
    PayloadLength { size: usize, expected: usize },

    /// Length-prefixed frames cannot carry an empty payload.
    #[error("payload must not be empty")]
    EmptyPayload,

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
