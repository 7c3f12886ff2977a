//! TeleInfo meter session.
//!
//! This is the "just works" layer. Feed it bytes (or point it at a byte
//! source), and drain published readings on your own schedule:
//!
//! ```
//! use teleinfo_meter::Meter;
//! use teleinfo_registry::{FieldValue, Label};
//!
//! let mut meter = Meter::new();
//! meter.feed_slice(b"\nIINST 23 ,\r");
//! assert_eq!(
//!     meter.drain_changed(),
//!     vec![(Label::Iinst, FieldValue::Numeric(23.0))]
//! );
//! ```

pub mod config;
pub mod error;
pub mod meter;
pub mod publisher;
pub mod switch;

pub use config::{MeterConfig, DEFAULT_PUBLISH_INTERVAL};
pub use error::{MeterError, PublishError, Result};
pub use meter::{DecodeStats, FrameEvent, Meter};
pub use publisher::{Publisher, Reading, Sink};
pub use switch::EnableSwitch;
