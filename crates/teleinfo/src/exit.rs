use std::fmt;
use std::io;

use teleinfo_frame::FrameError;
use teleinfo_meter::{MeterError, PublishError};
use teleinfo_transport::TransportError;

pub const SUCCESS: i32 = 0;
/// Readings could not be written out, e.g. stdout was closed.
pub const OUTPUT_FAILED: i32 = 1;
/// The serial device or capture file could not be opened, configured or read.
pub const INPUT_UNAVAILABLE: i32 = 3;
/// The process may not open the serial device or capture file.
pub const ACCESS_DENIED: i32 = 50;
/// The input held frames but not one of them validated.
pub const NO_VALID_FRAMES: i32 = 60;
/// Arguments clap accepted but the meter cannot use.
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

/// A failed command: the exit code plus the message printed to stderr.
#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn with_context(code: i32, context: &str, err: impl fmt::Display) -> Self {
        Self::new(code, format!("{context}: {err}"))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

fn code_for_io(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => ACCESS_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::UnexpectedEof => INPUT_UNAVAILABLE,
        io::ErrorKind::BrokenPipe | io::ErrorKind::WriteZero => OUTPUT_FAILED,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::with_context(code_for_io(err.kind()), context, err)
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Open { source, .. } | TransportError::Configure { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            ACCESS_DENIED
        }
        TransportError::Io(source) => code_for_io(source.kind()),
        TransportError::Open { .. } | TransportError::Configure { .. } | TransportError::Empty => {
            INPUT_UNAVAILABLE
        }
    };
    CliError::with_context(code, context, err)
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Io(source) => io_error(context, source),
        FrameError::Parse(_) | FrameError::ChecksumMismatch { .. } => {
            CliError::with_context(NO_VALID_FRAMES, context, err)
        }
    }
}

pub fn meter_error(context: &str, err: MeterError) -> CliError {
    match err {
        MeterError::Transport(err) => transport_error(context, err),
    }
}

pub fn publish_error(context: &str, err: PublishError) -> CliError {
    match err {
        PublishError::Io(source) => io_error(context, source),
        rejected @ PublishError::Rejected(_) => {
            CliError::with_context(OUTPUT_FAILED, context, rejected)
        }
    }
}
