use std::time::Duration;

/// Errors that can occur while moving bytes over a sensor transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the specified port.
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// No byte arrived within the per-read timeout.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end of input.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Returns true if this error is a per-read timeout.
    ///
    /// Timeouts are still fatal to the acquisition call that hit them; callers
    /// use this to decide whether retrying the whole call makes sense.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
