use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{CompletedFrame, FrameConfig, CR, LF};

/// Collects bytes between frame boundaries.
///
/// `\r` completes a frame, `\n` restarts one, and a buffer growing past the
/// configured cap is dropped with a warning. Callers only ever see complete
/// frames; the in-progress buffer never leaves this type.
#[derive(Debug)]
pub struct FrameAccumulator {
    buf: BytesMut,
    max_len: usize,
    overflows: u64,
}

impl FrameAccumulator {
    /// Create an accumulator with the default 50-byte cap.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create an accumulator with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.max_frame_len + 1),
            max_len: config.max_frame_len,
            overflows: 0,
        }
    }

    /// Consume one byte, returning a frame when `byte` terminates one.
    pub fn feed(&mut self, byte: u8) -> Option<CompletedFrame> {
        match byte {
            CR => {
                if self.buf.is_empty() {
                    return None;
                }
                let frame = Bytes::copy_from_slice(&self.buf);
                self.buf.clear();
                Some(CompletedFrame::new(frame))
            }
            LF => {
                self.buf.clear();
                None
            }
            _ => {
                self.buf.put_u8(byte);
                if self.buf.len() > self.max_len {
                    tracing::warn!(
                        len = self.buf.len(),
                        max = self.max_len,
                        content = %String::from_utf8_lossy(&self.buf),
                        "frame buffer too big, discarded"
                    );
                    self.overflows = self.overflows.saturating_add(1);
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// Drop any partially collected frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes collected since the last boundary.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// How many buffers were discarded for exceeding the cap.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// The configured cap.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
