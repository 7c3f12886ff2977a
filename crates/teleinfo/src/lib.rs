//! Enedis TeleInfo (TIC) meter decoder.
//!
//! teleinfo turns the serial output of a French electricity meter into
//! typed field updates: frame accumulation, checksum validation, a
//! change-tracking field table and a publisher for changed readings.
//!
//! # Crate Structure
//!
//! - [`transport`]: polled byte sources (memory, any `Read`, serial ports)
//! - [`frame`]: frame accumulation, group decoding and checksums
//! - [`registry`]: the label table and change-tracking field store
//! - [`meter`]: the meter session and publisher (behind `meter` feature)

/// Re-export transport types.
pub mod transport {
    pub use teleinfo_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use teleinfo_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use teleinfo_registry::*;
}

/// Re-export meter types (requires `meter` feature).
#[cfg(feature = "meter")]
pub mod meter {
    pub use teleinfo_meter::*;
}
