use super::Value;
use indexmap::IndexMap;
use std::fmt;

/// Field name to value, in insertion order.
pub type FieldMap = IndexMap<String, Value>;

/// A raw row as returned by a query gateway.
pub type Row = FieldMap;

/// Declared field kinds of a model type, in declaration order.
pub type ModelSchema = IndexMap<String, FieldKind>;

/// Kind a schema field is normalized to when a row is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Declared column that is passed through untouched.
    Raw,
}

impl FieldKind {
    /// Maps a declared type tag onto a kind. Unknown tags are `Raw`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "str" | "string" | "date" | "datetime" => Self::Text,
            "int" | "integer" | "decimal" => Self::Integer,
            "flt" | "float" | "double" | "real" => Self::Float,
            "bool" | "boolean" => Self::Boolean,
            _ => Self::Raw,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Raw => write!(f, "RAW"),
        }
    }
}
