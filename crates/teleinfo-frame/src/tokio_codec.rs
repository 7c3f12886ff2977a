use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::accumulator::FrameAccumulator;
use crate::codec::{CompletedFrame, FrameConfig};
use crate::error::FrameError;

/// `tokio_util` decoder yielding TeleInfo frames from an async byte stream.
///
/// Every input byte is moved into the accumulator, so a trailing partial
/// frame at end of stream is dropped silently like any other unterminated
/// frame.
#[derive(Debug, Default)]
pub struct TeleinfoCodec {
    accumulator: FrameAccumulator,
}

impl TeleinfoCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            accumulator: FrameAccumulator::with_config(config),
        }
    }
}

impl Decoder for TeleinfoCodec {
    type Item = CompletedFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            if let Some(frame) = self.accumulator.feed(src.get_u8()) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
