use std::path::PathBuf;

/// Errors that can occur while pulling bytes from a meter.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply line settings to the serial device.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred while reading the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `read` was called while no byte was available.
    #[error("no byte available")]
    Empty,
}

pub type Result<T> = std::result::Result<T, TransportError>;
