use teleinfo_transport::ByteSource;

use crate::accumulator::FrameAccumulator;
use crate::codec::{CompletedFrame, FrameConfig};
use crate::error::Result;

/// Pulls complete frames out of any [`ByteSource`] without blocking.
///
/// Partial frames stay buffered across calls; callers always get complete
/// frames.
pub struct FrameReader<S> {
    inner: S,
    accumulator: FrameAccumulator,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: S, config: FrameConfig) -> Self {
        Self {
            inner,
            accumulator: FrameAccumulator::with_config(config),
        }
    }

    /// Return the next complete frame, or `None` once the source has nothing
    /// more available right now.
    pub fn next_frame(&mut self) -> Result<Option<CompletedFrame>> {
        while self.inner.available()? > 0 {
            let byte = self.inner.read()?;
            if let Some(frame) = self.accumulator.feed(byte) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Whether the underlying source is finished.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Frames discarded for exceeding the length cap so far.
    pub fn overflow_count(&self) -> u64 {
        self.accumulator.overflow_count()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the reader and return the inner source. A partial frame is lost.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind, Read};

    use bytes::BytesMut;
    use teleinfo_transport::{MemorySource, StreamSource, TransportError};

    use super::*;
    use crate::codec::encode_group;
    use crate::error::FrameError;

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_group("IINST", "23", &mut wire);

        let mut reader = FrameReader::new(MemorySource::from(&wire[..]));
        let frame = reader.next_frame().unwrap().unwrap();

        assert_eq!(frame.as_bytes(), b"IINST 23 ,");
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn read_multiple_frames() {
        let mut wire = BytesMut::new();
        encode_group("ADCO", "031234567890", &mut wire);
        encode_group("OPTARIF", "BASE", &mut wire);
        encode_group("PAPP", "01250", &mut wire);

        let mut reader = FrameReader::new(StreamSource::new(Cursor::new(wire.to_vec())));
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            frames.push(frame.to_string());
        }

        assert_eq!(
            frames,
            vec!["ADCO 031234567890 G", "OPTARIF BASE 0", "PAPP 01250 )"]
        );
        assert!(reader.is_closed());
    }

    #[test]
    fn partial_frame_survives_between_polls() {
        let mut reader = FrameReader::new(MemorySource::new());

        reader.get_mut().push(b"\nPAPP 01");
        assert!(reader.next_frame().unwrap().is_none());

        reader.get_mut().push(b"250 )\r");
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"PAPP 01250 )");
    }

    #[test]
    fn byte_by_byte_stream() {
        let byte_reader = ByteByByteReader {
            bytes: b"\nIMAX 090 H\r".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(StreamSource::new(byte_reader));

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"IMAX 090 H");
    }

    #[test]
    fn oversized_frame_is_skipped() {
        let mut wire = vec![b'9'; 80];
        wire.extend_from_slice(b"\nIINST 23 ,\r");

        let cfg = FrameConfig { max_frame_len: 16 };
        let mut reader = FrameReader::with_config(MemorySource::from(wire.as_slice()), cfg);

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"IINST 23 ,");
        assert_eq!(reader.overflow_count(), 4);
    }

    #[test]
    fn source_error_propagates() {
        let mut reader = FrameReader::new(StreamSource::new(Failing));
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Io(e)) if e.kind() == ErrorKind::ConnectionReset
        ));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(MemorySource::new());
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
