use std::fmt;

use serde::Serialize;

use crate::label::{FieldKind, Label};

/// A stored field value. Numeric values are kept raw and unscaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Numeric(f64),
    Text(String),
}

impl FieldValue {
    /// Initial value for a field of `kind`.
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Numeric => FieldValue::Numeric(0.0),
            FieldKind::Text => FieldValue::Text(String::new()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Numeric(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Numeric(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Locale-free decimal parse of the whole payload. `None` for anything that is
/// not a finite number, including digits followed by other characters.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One entry of the field table.
#[derive(Debug, Clone)]
pub struct Field {
    label: Label,
    value: FieldValue,
    dirty: bool,
}

impl Field {
    pub(crate) fn new(label: Label) -> Self {
        Self {
            label,
            value: FieldValue::empty(label.kind()),
            dirty: false,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn kind(&self) -> FieldKind {
        self.label.kind()
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Changed since the last drain.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Store `next` if it differs bit-for-bit. Returns whether it changed.
    pub(crate) fn set_numeric(&mut self, next: f64) -> bool {
        if matches!(self.value, FieldValue::Numeric(current) if current.to_bits() == next.to_bits())
        {
            return false;
        }
        self.value = FieldValue::Numeric(next);
        self.dirty = true;
        true
    }

    /// Store `next` if it differs. Returns whether it changed.
    pub(crate) fn set_text(&mut self, next: &str) -> bool {
        if matches!(&self.value, FieldValue::Text(current) if current == next) {
            return false;
        }
        self.value = FieldValue::Text(next.to_owned());
        self.dirty = true;
        true
    }

    pub(crate) fn take_dirty(&mut self) -> Option<FieldValue> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.value.clone())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
