pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{FieldKind, FieldMap, ModelSchema, Row};
pub use value::Value;
