/// Errors that can occur while polling a meter.
#[derive(Debug, thiserror::Error)]
pub enum MeterError {
    /// The byte source failed.
    #[error("transport error: {0}")]
    Transport(#[from] teleinfo_transport::TransportError),
}

/// Errors a [`Sink`](crate::Sink) reports back to the publisher.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The sink refused the reading.
    #[error("sink rejected reading: {0}")]
    Rejected(String),

    /// An I/O error occurred while writing the reading.
    #[error("publish I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MeterError>;
