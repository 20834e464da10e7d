use super::{Attribute, ModelMeta, RecordState};
use crate::coerce::coerce_fields;
use crate::core::{FieldMap, Result, Row, Value};
use crate::gateway::{Filter, ID_COLUMN, QueryGateway};
use crate::projection::project;
use crate::store::FieldStore;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Read-only attribute every record resolves to its table name.
pub const TABLE_NAME_ATTRIBUTE: &str = "table_name";

/// A single row-mapped entity
///
/// A record starts out new (never persisted). Loading it from storage or
/// saving it makes it clean; changing an existing field afterwards makes it
/// dirty until the next save. Saving a new record inserts every field, saving
/// a dirty record updates only the changed ones, and saving a clean record
/// does nothing.
///
/// Reads and writes by name go through computed accessors and mutators
/// declared on the record's [`ModelMeta`] before falling back to the stored
/// fields.
#[derive(Clone)]
pub struct Record {
    meta: Arc<ModelMeta>,
    gateway: Arc<dyn QueryGateway>,
    store: FieldStore,
    is_new: bool,
}

impl Record {
    pub fn new(meta: Arc<ModelMeta>, gateway: Arc<dyn QueryGateway>) -> Self {
        let store = FieldStore::new(meta.config().track_changes);
        Self {
            meta,
            gateway,
            store,
            is_new: true,
        }
    }

    /// Builds a clean, loaded record of the given type from a raw row.
    pub fn from_row(meta: Arc<ModelMeta>, gateway: Arc<dyn QueryGateway>, row: Row) -> Result<Self> {
        let mut record = Self::new(meta, gateway);
        record.setup(row)?;
        Ok(record)
    }

    /// Bulk-populates from a raw row without dirty tracking, coerces declared
    /// fields and marks the record as loaded. Pending changes from before the
    /// load are discarded.
    ///
    /// On a coercion error the record is left unchanged.
    pub fn setup(&mut self, row: Row) -> Result<&mut Self> {
        let mut store = self.store.clone();
        store.populate(row);
        store.clear_modified();
        coerce_fields(store.fields_mut(), self.meta.schema(), self.meta.config().coercion)?;

        trace!(
            table = %self.meta.table_name(),
            fields = store.fields().len(),
            "populated record from row"
        );
        self.store = store;
        self.is_new = false;
        Ok(self)
    }

    /// Captures the record's fields, pending changes and lifecycle flags.
    pub fn state(&self) -> RecordState {
        RecordState {
            fields: self.store.fields().clone(),
            modified: self.store.snapshot_modified().clone(),
            is_new: self.is_new,
            track_changes: self.store.is_tracking(),
        }
    }

    /// Rebuilds a record from a captured [`RecordState`]. Pending changes
    /// survive, so saving the restored record writes what the original would
    /// have written.
    pub fn restore(meta: Arc<ModelMeta>, gateway: Arc<dyn QueryGateway>, state: RecordState) -> Self {
        let RecordState {
            fields,
            modified,
            is_new,
            track_changes,
        } = state;
        Self {
            meta,
            gateway,
            store: FieldStore::from_parts(fields, modified, track_changes),
            is_new,
        }
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    pub fn table_name(&self) -> &str {
        self.meta.table_name()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn properties(&self) -> &FieldMap {
        self.store.fields()
    }

    pub fn modified(&self) -> &FieldMap {
        self.store.snapshot_modified()
    }

    pub fn id(&self) -> Value {
        self.store.value(ID_COLUMN)
    }

    /// Raw stored value, bypassing computed accessors.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    /// Raw tracked write, bypassing computed mutators. Unlike [`set`](Self::set)
    /// this may introduce a new field.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.store.set(name, value.into());
        self
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        self.store.set_tracking(enabled);
    }

    // ------------------------------------------------------------------
    // Attribute access
    // ------------------------------------------------------------------

    /// Resolves `name` through a declared accessor, then the built-in
    /// `table_name` attribute, then the stored fields.
    pub fn attribute(&self, name: &str) -> Attribute {
        if let Some(accessor) = self.meta.accessor(name) {
            return Attribute::Computed(accessor(self));
        }
        if name == TABLE_NAME_ATTRIBUTE {
            return Attribute::Computed(Value::from(self.meta.table_name()));
        }
        match self.store.get(name) {
            Some(value) => Attribute::Stored(value.clone()),
            None => Attribute::Absent,
        }
    }

    pub fn get(&self, name: &str) -> Value {
        self.attribute(name).into_value()
    }

    /// Writes through a computed mutator if one exists, otherwise into an
    /// existing field. Writes to unknown names are dropped.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if let Some(mutator) = self.meta.mutator(name).cloned() {
            mutator(self, value);
        } else if self.store.contains(name) {
            self.store.set(name, value);
        } else {
            trace!(table = %self.meta.table_name(), field = name, "dropped write to unknown field");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.meta.accessor(name).is_some()
            || name == TABLE_NAME_ATTRIBUTE
            || self.store.contains(name)
    }

    /// Fields cannot be removed once present; this does nothing.
    pub fn remove(&mut self, _name: &str) {}

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Names exposed by iteration and serialization.
    pub fn exported_fields(&self) -> Vec<String> {
        project(self.store.field_names(), self.meta.projection())
    }

    pub fn iter(&self) -> Fields<'_> {
        Fields {
            record: self,
            names: self.exported_fields().into_iter(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(name, value)| (name, value.to_json()))
                .collect(),
        )
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    /// Loads the row with the given identifier into this record.
    pub async fn load(&mut self, id: impl Into<Value>) -> Result<Option<&mut Self>> {
        self.one(&Filter::by_id(id)).await
    }

    /// Fetches the row with the given identifier as a new record.
    pub async fn load_cloned(&self, id: impl Into<Value>) -> Result<Option<Record>> {
        self.one_cloned(&Filter::by_id(id)).await
    }

    /// Loads the first row matching `filter` into this record. Without a
    /// match the record is left as it was.
    pub async fn one(&mut self, filter: &Filter) -> Result<Option<&mut Self>> {
        let row = self.gateway.fetch_one(self.meta.table_name(), filter).await?;
        match row {
            Some(row) => Ok(Some(self.setup(row)?)),
            None => Ok(None),
        }
    }

    /// Fetches the first row matching `filter` as a new record of the same
    /// type, leaving this one untouched.
    pub async fn one_cloned(&self, filter: &Filter) -> Result<Option<Record>> {
        self.gateway
            .fetch_one(self.meta.table_name(), filter)
            .await?
            .map(|row| self.sibling(row))
            .transpose()
    }

    pub async fn many(&self, filter: &Filter) -> Result<Vec<Record>> {
        let rows = self.gateway.fetch_many(self.meta.table_name(), filter).await?;
        rows.into_iter().map(|row| self.sibling(row)).collect()
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64> {
        self.gateway.count(self.meta.table_name(), filter).await
    }

    /// Runs a raw query and maps every row onto a record of this type.
    pub async fn raw_query(&self, sql: &str) -> Result<Vec<Record>> {
        let rows = self.gateway.raw_query(sql).await?;
        rows.into_iter().map(|row| self.sibling(row)).collect()
    }

    /// Inserts a new record, updates a dirty one, or does nothing.
    pub async fn save(&mut self) -> Result<&mut Self> {
        if self.is_new {
            let id = self
                .gateway
                .insert(self.meta.table_name(), self.store.fields())
                .await?;
            debug!(table = %self.meta.table_name(), %id, "inserted record");
            self.store.put(ID_COLUMN, id);
            self.is_new = false;
        } else {
            if !self.store.is_dirty() {
                trace!(table = %self.meta.table_name(), "record is clean, nothing to save");
                return Ok(self);
            }

            let filter = Filter::by_id(self.id());
            self.gateway
                .update(self.meta.table_name(), self.store.snapshot_modified(), &filter)
                .await?;
            debug!(
                table = %self.meta.table_name(),
                id = %self.id(),
                fields = self.store.snapshot_modified().len(),
                "updated record"
            );
        }

        self.store.clear_modified();
        Ok(self)
    }

    fn sibling(&self, row: Row) -> Result<Record> {
        Record::from_row(self.meta.clone(), self.gateway.clone(), row)
    }
}

/// Lazy `(name, value)` pairs over a record's exported fields.
///
/// Values are resolved when the pair is produced, so computed attributes
/// reflect the record at that moment.
pub struct Fields<'a> {
    record: &'a Record,
    names: std::vec::IntoIter<String>,
}

impl Iterator for Fields<'_> {
    type Item = (String, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        let value = self.record.get(&name);
        Some((name, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.names.size_hint()
    }
}

impl ExactSizeIterator for Fields<'_> {}

impl<'a> IntoIterator for &'a Record {
    type Item = (String, Value);
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.iter();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(&name, &value)?;
        }
        map.end()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type_name", &self.meta.type_name())
            .field("fields", self.store.fields())
            .field("modified", self.store.snapshot_modified())
            .field("is_new", &self.is_new)
            .finish()
    }
}
