//! Field storage with dirty tracking
//!
//! Holds the current values of a record next to the subset that changed since
//! the record was last clean. Only fields that already exist are tracked, so
//! introducing a field never makes a record dirty.

use crate::core::{FieldMap, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore {
    fields: FieldMap,
    modified: FieldMap,
    track_changes: bool,
}

impl FieldStore {
    pub fn new(track_changes: bool) -> Self {
        Self {
            fields: FieldMap::new(),
            modified: FieldMap::new(),
            track_changes,
        }
    }

    /// Rebuilds a store from previously captured contents.
    pub(crate) fn from_parts(fields: FieldMap, modified: FieldMap, track_changes: bool) -> Self {
        Self {
            fields,
            modified,
            track_changes,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Current value of `name`, `NULL` if it was never set.
    pub fn value(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Overwrites `name`, recording it as modified when tracking is on, the
    /// field already exists and the value actually differs.
    ///
    /// Returns whether the write marked the field dirty.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        let dirty = self.track_changes
            && self
                .fields
                .get(name)
                .is_some_and(|current| *current != value);

        if dirty {
            self.modified.insert(name.to_string(), value.clone());
        }
        self.fields.insert(name.to_string(), value);
        dirty
    }

    /// Writes without ever touching the modified set.
    pub(crate) fn put(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Bulk write with tracking suspended. Tracking is enabled afterwards.
    pub fn populate<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.track_changes = false;
        for (name, value) in row {
            self.set(&name, value);
        }
        self.track_changes = true;
    }

    pub fn snapshot_modified(&self) -> &FieldMap {
        &self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    pub fn is_tracking(&self) -> bool {
        self.track_changes
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        self.track_changes = enabled;
    }
}

impl Default for FieldStore {
    fn default() -> Self {
        Self::new(true)
    }
}
