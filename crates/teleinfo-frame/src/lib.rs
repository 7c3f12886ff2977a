//! TeleInfo frame accumulation, group decoding and checksum validation.
//!
//! A meter emits one group per line:
//! - `\n` (restart marker), `LABEL`, a separator, `VALUE`, a separator
//! - one checksum character
//! - `\r` (end of frame)
//!
//! Bytes go in one at a time; validated `(label, value)` groups come out.
//! Nothing here blocks, allocates beyond one frame, or owns a port.

pub mod accumulator;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod group;
pub mod reader;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use accumulator::FrameAccumulator;
pub use codec::{encode_group, CompletedFrame, FrameConfig, CR, DEFAULT_MAX_FRAME_LEN, LF, SP};
pub use error::{FrameError, ParseError, Result};
pub use group::{decode, DecodedGroup};
pub use reader::FrameReader;

#[cfg(feature = "async")]
pub use tokio_codec::TeleinfoCodec;
