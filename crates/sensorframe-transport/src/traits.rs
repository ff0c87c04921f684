use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A source of single bytes with a bounded wait.
///
/// Each call blocks for at most `timeout` and yields exactly one byte. A
/// source never buffers frames; any buffering belongs to the device or OS.
pub trait ByteSource {
    /// Read one byte, waiting no longer than `timeout`.
    fn read_byte(&mut self, timeout: Duration) -> Result<u8>;
}

/// A sink for outbound command bytes.
pub trait CommandSink {
    /// Write all of `bytes` to the device.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        (**self).read_byte(timeout)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        (**self).read_byte(timeout)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }
}

/// Adapts any `Read`/`Write` stream into a [`ByteSource`] and [`CommandSink`].
///
/// A generic stream has no per-call timeout, so the `timeout` argument is only
/// used to label [`TransportError::Timeout`] when the stream itself reports
/// `WouldBlock` or `TimedOut`. Configure the stream's own read timeout (for
/// example `TcpStream::set_read_timeout`) to bound blocking.
pub struct StreamPort<T> {
    inner: T,
}

impl<T> StreamPort<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the port and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> ByteSource for StreamPort<T> {
    fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Err(TransportError::Timeout(timeout))
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Write> CommandSink for StreamPort<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T> std::fmt::Debug for StreamPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPort")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
