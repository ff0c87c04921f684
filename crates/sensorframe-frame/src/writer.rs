use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, encode_gps_frame, Frame, GpsLogHeader};
use crate::descriptor::{Protocol, GPS};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = GPS.capacity;

/// Writes encoded sensor frames to any `Write` stream.
///
/// Used by simulators and fixture generators; devices only ever send frames.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    protocol: Protocol,
}

impl<T: Write> FrameWriter<T> {
    /// Create a writer emitting frames of `protocol`.
    pub fn new(inner: T, protocol: Protocol) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            protocol,
        }
    }

    /// Encode `payload` with a default header and write it (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(self.protocol, payload, &mut self.buf)?;
        self.flush_buf()
    }

    /// Encode a GPS log with an explicit header and write it.
    pub fn send_gps(&mut self, header: &GpsLogHeader, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_gps_frame(header, payload, &mut self.buf)?;
        self.flush_buf()
    }

    /// Write a previously decoded frame byte-for-byte.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_raw(frame.as_bytes())
    }

    /// Write bytes verbatim, outside any framing.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Wire format written by [`send`](Self::send).
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
