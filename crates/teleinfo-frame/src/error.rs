/// Why a completed frame could not be split into a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The frame lacks the separator after the label or after the value.
    #[error("frame has no label/value separator")]
    NoSeparator,

    /// The label or value is not valid UTF-8.
    #[error("frame label or value is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors that can occur while turning bytes into validated groups.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is malformed.
    #[error("malformed frame: {0}")]
    Parse(#[from] ParseError),

    /// The transmitted checksum does not match the recomputed one.
    #[error("checksum mismatch (received 0x{received:02X}, computed 0x{computed:02X})")]
    ChecksumMismatch { received: u8, computed: u8 },

    /// The byte source failed.
    #[error("byte source error: {0}")]
    Transport(#[from] teleinfo_transport::TransportError),

    /// An I/O error occurred while reading frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
