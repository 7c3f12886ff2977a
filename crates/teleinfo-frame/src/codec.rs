use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;

/// End of frame.
pub const CR: u8 = b'\r';

/// Frame restart marker.
pub const LF: u8 = b'\n';

/// Separator written by [`encode_group`].
pub const SP: u8 = b' ';

/// Longest frame the accumulator keeps before discarding it.
pub const DEFAULT_MAX_FRAME_LEN: usize = 50;

/// The bytes collected between two boundaries, without delimiters.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletedFrame {
    bytes: Bytes,
}

impl CompletedFrame {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&'static str> for CompletedFrame {
    fn from(text: &'static str) -> Self {
        Self::new(Bytes::from_static(text.as_bytes()))
    }
}

impl fmt::Display for CompletedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for CompletedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompletedFrame({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

/// Configuration for frame accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum buffered frame length in bytes. Default: 50.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Encode one group the way a meter transmits it.
///
/// Wire format:
/// ```text
/// ┌────┬───────┬────┬───────┬────┬──────────┬────┐
/// │ LF │ LABEL │ SP │ VALUE │ SP │ CHECKSUM │ CR │
/// └────┴───────┴────┴───────┴────┴──────────┴────┘
/// ```
/// The checksum covers `LABEL SP VALUE`.
pub fn encode_group(label: &str, value: &str, dst: &mut BytesMut) {
    dst.reserve(label.len() + value.len() + 5);
    dst.put_u8(LF);
    let start = dst.len();
    dst.put_slice(label.as_bytes());
    dst.put_u8(SP);
    dst.put_slice(value.as_bytes());
    let sum = checksum::compute(&dst[start..]);
    dst.put_u8(SP);
    dst.put_u8(sum);
    dst.put_u8(CR);
}
