use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::field::{parse_numeric, Field, FieldValue};
use crate::label::{FieldKind, Label};

/// Result of applying one validated group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The stored value changed and the field is now dirty.
    Changed,
    /// Same value as stored; nothing changed.
    Unchanged,
    /// The label is not in the table.
    Ignored,
}

impl UpdateOutcome {
    pub fn is_changed(self) -> bool {
        self == UpdateOutcome::Changed
    }
}

/// Label-indexed table of typed fields.
pub struct FieldRegistry {
    fields: [Field; Label::COUNT],
    parse_failures: u64,
}

impl FieldRegistry {
    /// Create the table with every field at its initial value (0 or empty) and clean.
    pub fn new() -> Self {
        Self {
            fields: Label::ALL.map(Field::new),
            parse_failures: 0,
        }
    }

    /// Apply a validated `(label, value)` pair.
    ///
    /// Unknown labels are ignored. A numeric payload that does not parse is
    /// stored as `0` and counted in [`parse_failures`](Self::parse_failures).
    pub fn apply(&mut self, label: &str, value: &str) -> UpdateOutcome {
        match Label::lookup(label) {
            Some(known) => self.apply_label(known, value),
            None => {
                info!(label, value, "data ignored");
                UpdateOutcome::Ignored
            }
        }
    }

    /// Apply a value to a known label.
    pub fn apply_label(&mut self, label: Label, value: &str) -> UpdateOutcome {
        let changed = match label.kind() {
            FieldKind::Numeric => {
                let number = parse_numeric(value).unwrap_or_else(|| {
                    debug!(%label, value, "non-numeric payload, using 0");
                    self.parse_failures = self.parse_failures.saturating_add(1);
                    0.0
                });
                self.fields[label.index()].set_numeric(number)
            }
            FieldKind::Text => self.fields[label.index()].set_text(value),
        };

        if changed {
            debug!(%label, value, "field updated");
            UpdateOutcome::Changed
        } else {
            UpdateOutcome::Unchanged
        }
    }

    /// Every dirty field with its current value, in table order. Clears the
    /// reported flags.
    pub fn drain_changed(&mut self) -> Vec<(Label, FieldValue)> {
        self.fields
            .iter_mut()
            .filter_map(|field| field.take_dirty().map(|value| (field.label(), value)))
            .collect()
    }

    /// Flag a field for the next drain without changing its value.
    ///
    /// Used to hand back readings a sink failed to take.
    pub fn mark_dirty(&mut self, label: Label) {
        self.fields[label.index()].mark_dirty();
    }

    pub fn get(&self, label: Label) -> &Field {
        &self.fields[label.index()]
    }

    pub fn value(&self, label: Label) -> &FieldValue {
        self.get(label).value()
    }

    pub fn is_dirty(&self, label: Label) -> bool {
        self.get(label).is_dirty()
    }

    pub fn dirty_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_dirty()).count()
    }

    /// All fields in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Numeric payloads that failed to parse and were stored as 0.
    pub fn parse_failures(&self) -> u64 {
        self.parse_failures
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("dirty", &self.dirty_count())
            .field("parse_failures", &self.parse_failures)
            .finish()
    }
}

/// A [`FieldRegistry`] shared between an ingestion thread and a publisher.
///
/// `apply` and `drain_changed` hold the same lock, so a drain sees a
/// consistent table and an update racing a drain is reported by that drain
/// or the next one.
#[derive(Clone, Default, Debug)]
pub struct SharedRegistry {
    inner: Arc<Mutex<FieldRegistry>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, label: &str, value: &str) -> UpdateOutcome {
        self.lock().apply(label, value)
    }

    pub fn drain_changed(&self) -> Vec<(Label, FieldValue)> {
        self.lock().drain_changed()
    }

    pub fn mark_dirty(&self, label: Label) {
        self.lock().mark_dirty(label);
    }

    /// Current value of one field.
    pub fn value(&self, label: Label) -> FieldValue {
        self.lock().value(label).clone()
    }

    /// Every field's current value, without touching dirty flags.
    pub fn snapshot(&self) -> Vec<(Label, FieldValue)> {
        self.lock()
            .iter()
            .map(|field| (field.label(), field.value().clone()))
            .collect()
    }

    /// Run `f` with the table locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut FieldRegistry) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, FieldRegistry> {
        // A panic while holding the lock leaves at most one field half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
