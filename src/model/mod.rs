//! Records and their per-type metadata
//!
//! - `meta.rs` - `ModelMeta`: schema, export rules, computed attributes
//! - `record.rs` - `Record`: field access, lifecycle, export
//! - `state.rs` - `RecordState`: serializable record snapshot

mod meta;
mod record;
mod state;

pub use meta::{
    Accessor, ModelMeta, ModelMetaBuilder, Mutator, RECORD_TYPE_SUFFIX_LEN, table_name_for,
};
pub use record::{Fields, Record, TABLE_NAME_ATTRIBUTE};
pub use state::RecordState;

use crate::core::Value;

/// Outcome of resolving a named attribute on a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Produced by a computed accessor
    Computed(Value),
    /// Read from the stored fields
    Stored(Value),
    Absent,
}

impl Attribute {
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// The resolved value, `NULL` when absent.
    pub fn into_value(self) -> Value {
        match self {
            Self::Computed(value) | Self::Stored(value) => value,
            Self::Absent => Value::Null,
        }
    }
}
