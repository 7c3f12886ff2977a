//! Typed TeleInfo field table with change tracking.
//!
//! Every known label owns exactly one [`Field`]. A validated group updates its
//! field only when the value actually changed, and marks it dirty. The
//! publishing side calls [`FieldRegistry::drain_changed`] on its own schedule
//! to collect and clear the dirty fields.
//!
//! Use [`SharedRegistry`] when ingestion and publication run on different
//! threads.

pub mod error;
pub mod field;
pub mod label;
pub mod registry;

pub use error::{RegistryError, Result};
pub use field::{parse_numeric, Field, FieldValue};
pub use label::{FieldKind, Label};
pub use registry::{FieldRegistry, SharedRegistry, UpdateOutcome};
