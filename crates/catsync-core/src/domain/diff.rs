//! Field-level diffing between a stored record and its incoming counterpart

use serde::Serialize;
use serde_json::Value;

/// One field whose incoming value differs from the stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// Compares a stored record against an incoming one of the same kind
///
/// Implementations list every mapped field except the key. An empty result
/// means the stored row is already up to date.
pub trait FieldDiff {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange>;
}

/// Accumulates [`FieldChange`]s one field at a time
#[derive(Debug, Default)]
pub struct DiffBuilder {
    changes: Vec<FieldChange>,
}

impl DiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change when `old != new`
    pub fn field<T: PartialEq + Serialize>(mut self, name: &'static str, old: &T, new: &T) -> Self {
        if old != new {
            self.changes.push(FieldChange {
                field: name,
                old: render_value(old),
                new: render_value(new),
            });
        }
        self
    }

    pub fn finish(self) -> Vec<FieldChange> {
        self.changes
    }
}

/// Renders a field value for the change report.
///
/// Strings are shown bare, absent values as `null`, everything else as JSON.
pub fn render_value<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::from("<unrenderable>"),
    }
}
