//! Byte source abstraction for TeleInfo meters.
//!
//! The decoder never owns a port. It polls a [`ByteSource`], which exposes
//! how many bytes are ready and hands them out one at a time:
//! - [`MemorySource`] for embedders that already receive bytes elsewhere
//! - [`StreamSource`] over any `std::io::Read` (files, stdin, pipes)
//! - [`SerialPort`] for a tty wired to the meter's TIC output (unix)
//!
//! This is the lowest layer of teleinfo. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{ByteSource, MemorySource, StreamSource};

#[cfg(unix)]
pub use serial::{BaudRate, SerialConfig, SerialPort};
