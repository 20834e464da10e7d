// ============================================================================
// rowmodel - active record core
// ============================================================================

pub mod coerce;
pub mod config;
pub mod core;
pub mod gateway;
pub mod model;
pub mod projection;
pub mod store;

// Re-export main types for convenience
pub use coerce::CoercionMode;
pub use config::ModelConfig;
pub use crate::core::{DbError, FieldKind, FieldMap, ModelSchema, Result, Row, Value};
pub use gateway::{Filter, MemoryGateway, QueryGateway, ID_COLUMN};
pub use model::{Attribute, Fields, ModelMeta, ModelMetaBuilder, Record, RecordState, table_name_for};
pub use projection::ProjectionRule;
pub use store::FieldStore;
