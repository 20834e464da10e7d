use super::sql::{InsertStatementBuilder, SelectStatementBuilder, UpdateStatementBuilder, parse_select};
use super::{Filter, ID_COLUMN, QueryGateway};
use crate::core::{DbError, FieldMap, Result, Row, Value};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct MemoryTable {
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryTable {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn has_id(&self, id: &Value) -> bool {
        self.rows
            .iter()
            .any(|row| row.get(ID_COLUMN).is_some_and(|existing| existing.sql_eq(id)))
    }

    /// Hands out the next free counter value. The counter stops at
    /// `i64::MAX`, so once that id is taken allocation fails.
    fn allocate_id(&mut self) -> Option<Value> {
        let id = Value::Integer(self.next_id);
        if self.has_id(&id) {
            return None;
        }
        self.next_id = self.next_id.saturating_add(1);
        Some(id)
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |row| filter.matches(row))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    statements: Vec<String>,
}

impl MemoryState {
    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn record(&mut self, sql: String) {
        debug!(%sql, "memory gateway statement");
        self.statements.push(sql);
    }
}

/// Query gateway over in-process tables
///
/// Rows keep their column order, identifiers are assigned from a per-table
/// counter, and every operation is logged as the SQL a database-backed
/// gateway would run. Tables must be created before use.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = tables
            .into_iter()
            .map(|name| (name.into(), MemoryTable::new()))
            .collect();

        Self {
            state: Mutex::new(MemoryState {
                tables,
                statements: Vec::new(),
            }),
        }
    }

    /// Creates `name` if it does not exist yet.
    pub async fn create_table(&self, name: &str) {
        let mut state = self.state.lock().await;
        state
            .tables
            .entry(name.to_string())
            .or_insert_with(MemoryTable::new);
    }

    /// Every statement executed so far, oldest first.
    pub async fn statements(&self) -> Vec<String> {
        self.state.lock().await.statements.clone()
    }

    pub async fn clear_statements(&self) {
        self.state.lock().await.statements.clear();
    }

    /// Current contents of `table`, bypassing the statement log.
    pub async fn rows(&self, table: &str) -> Result<Vec<Row>> {
        let state = self.state.lock().await;
        Ok(state.table(table)?.rows.clone())
    }
}

#[async_trait]
impl QueryGateway for MemoryGateway {
    async fn fetch_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let mut state = self.state.lock().await;
        state.record(SelectStatementBuilder::new(table).filter(filter).limit(1).build());
        Ok(state.table(table)?.matching(filter).next().cloned())
    }

    async fn fetch_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>> {
        let mut state = self.state.lock().await;
        state.record(SelectStatementBuilder::new(table).filter(filter).build());
        Ok(state.table(table)?.matching(filter).cloned().collect())
    }

    async fn insert(&self, table: &str, fields: &FieldMap) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.record(InsertStatementBuilder::new(table, fields).build());
        let target = state.table_mut(table)?;

        let id = match fields.get(ID_COLUMN) {
            Some(id) if !id.is_null() => {
                if target.has_id(id) {
                    return Err(DbError::ConstraintViolation(format!(
                        "duplicate {} {} in table '{}'",
                        ID_COLUMN, id, table
                    )));
                }
                if let Value::Integer(explicit) = id {
                    target.next_id = target.next_id.max(explicit.saturating_add(1));
                }
                id.clone()
            }
            _ => target.allocate_id().ok_or_else(|| {
                DbError::ConstraintViolation(format!("no {} left to assign in table '{}'", ID_COLUMN, table))
            })?,
        };

        let mut row = Row::with_capacity(fields.len() + 1);
        row.insert(ID_COLUMN.to_string(), id.clone());
        row.extend(
            fields
                .iter()
                .filter(|(name, _)| name.as_str() != ID_COLUMN)
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        target.rows.push(row);

        Ok(id)
    }

    async fn update(&self, table: &str, fields: &FieldMap, filter: &Filter) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record(UpdateStatementBuilder::new(table, fields).filter(filter).build());

        for row in state.table_mut(table)?.rows.iter_mut() {
            if filter.matches(row) {
                row.extend(fields.iter().map(|(name, value)| (name.clone(), value.clone())));
            }
        }
        Ok(())
    }

    async fn count(&self, table: &str, filter: &Filter) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.record(SelectStatementBuilder::new(table).filter(filter).count().build());
        Ok(state.table(table)?.matching(filter).count() as u64)
    }

    async fn raw_query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut state = self.state.lock().await;
        state.record(sql.trim().to_string());

        let (table, filter) = parse_select(sql)?;
        Ok(state.table(&table)?.matching(&filter).cloned().collect())
    }
}
