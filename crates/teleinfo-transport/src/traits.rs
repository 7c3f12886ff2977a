use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::error::{Result, TransportError};

const READ_CHUNK_SIZE: usize = 256;

/// A polled source of meter bytes.
///
/// Callers check [`available`](ByteSource::available) before each
/// [`read`](ByteSource::read); a count of zero ends the current feed cycle.
/// Implementations must not block indefinitely in `available`.
pub trait ByteSource {
    /// Number of bytes that can be read right now.
    fn available(&mut self) -> Result<usize>;

    /// Take the next byte. Returns `TransportError::Empty` if none is ready.
    fn read(&mut self) -> Result<u8>;

    /// Whether the source has reached end of stream and will never yield again.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self) -> Result<u8> {
        (**self).read()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read(&mut self) -> Result<u8> {
        (**self).read()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// In-memory byte queue, filled by the caller.
#[derive(Debug, Default)]
pub struct MemorySource {
    buf: BytesMut,
    closed: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the end of the queue.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Mark the source as finished. Queued bytes can still be read.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl From<&[u8]> for MemorySource {
    fn from(bytes: &[u8]) -> Self {
        let mut source = Self::new();
        source.push(bytes);
        source
    }
}

impl ByteSource for MemorySource {
    fn available(&mut self) -> Result<usize> {
        Ok(self.buf.len())
    }

    fn read(&mut self) -> Result<u8> {
        if !self.buf.has_remaining() {
            return Err(TransportError::Empty);
        }
        Ok(self.buf.get_u8())
    }

    fn is_closed(&self) -> bool {
        self.closed && self.buf.is_empty()
    }
}

/// Adapts any `Read` into a [`ByteSource`].
///
/// Each `available` call on an empty buffer performs at most one read of the
/// inner stream. `WouldBlock` and `TimedOut` count as "nothing available",
/// which is how a serial port opened with a read timeout signals idle lines.
pub struct StreamSource<R> {
    inner: R,
    buf: BytesMut,
    eof: bool,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            eof: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the source and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!("byte stream reached end of file");
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(());
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn available(&mut self) -> Result<usize> {
        if self.buf.is_empty() && !self.eof {
            self.fill()?;
        }
        Ok(self.buf.len())
    }

    fn read(&mut self) -> Result<u8> {
        if self.available()? == 0 {
            return Err(TransportError::Empty);
        }
        Ok(self.buf.get_u8())
    }

    fn is_closed(&self) -> bool {
        self.eof && self.buf.is_empty()
    }
}

impl<R> std::fmt::Debug for StreamSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("buffered", &self.buf.len())
            .field("eof", &self.eof)
            .finish()
    }
}
