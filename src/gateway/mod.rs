//! Query gateway boundary
//!
//! Records never talk to storage directly. Every fetch, insert, update,
//! count and raw query goes through a [`QueryGateway`] injected at
//! construction. Gateway errors are handed back to the caller untouched.
//!
//! - `memory.rs` - in-process gateway over ordered in-memory tables
//! - `sql.rs` - SQL text rendering for the operations a gateway performs

pub mod memory;
pub mod sql;

pub use memory::MemoryGateway;

use crate::core::{FieldMap, Result, Row, Value};
use async_trait::async_trait;

/// Name of the identifier column every model table carries.
pub const ID_COLUMN: &str = "id";

/// Conjunction of column equality conditions. An empty filter matches every
/// row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: FieldMap,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(column, value)
    }

    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::eq(ID_COLUMN, id)
    }

    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(column.into(), value.into());
        self
    }

    pub fn conditions(&self) -> &FieldMap {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// A missing column behaves like `NULL` and never matches.
    pub fn matches(&self, row: &FieldMap) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            row.get(column)
                .is_some_and(|actual| actual.sql_eq(expected))
        })
    }
}

impl From<FieldMap> for Filter {
    fn from(conditions: FieldMap) -> Self {
        Self { conditions }
    }
}

/// Storage operations a record needs from its backing store.
///
/// Rows are returned raw; turning them into records (coercion, state
/// transitions) is the caller's job.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    async fn fetch_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>>;

    async fn fetch_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>>;

    /// Inserts `fields` and returns the generated identifier.
    async fn insert(&self, table: &str, fields: &FieldMap) -> Result<Value>;

    async fn update(&self, table: &str, fields: &FieldMap, filter: &Filter) -> Result<()>;

    async fn count(&self, table: &str, filter: &Filter) -> Result<u64>;

    async fn raw_query(&self, sql: &str) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(Filter::all().matches(&FieldMap::new()));
    }

    #[test]
    fn test_filter_conjunction() {
        let r = row(&[("id", Value::Integer(1)), ("name", Value::from("a"))]);

        assert!(Filter::by_id(1).matches(&r));
        assert!(Filter::by_id(1.0).matches(&r));
        assert!(Filter::by_id(1).and("name", "a").matches(&r));
        assert!(!Filter::by_id(1).and("name", "b").matches(&r));
        assert!(!Filter::eq("missing", Value::Null).matches(&r));
    }
}
