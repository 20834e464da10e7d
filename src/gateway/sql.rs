//! SQL text for gateway operations
//!
//! Builders render the statements a gateway performs. `parse_select` reads
//! back the one raw-query shape the in-memory gateway understands:
//! `SELECT * FROM table [WHERE col = literal [AND ...]]`.

use super::Filter;
use crate::core::{DbError, FieldMap, Result, Value};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SELECT_ALL: Regex = Regex::new(
        r#"(?is)^\s*SELECT\s+\*\s+FROM\s+"?([A-Za-z_][A-Za-z0-9_]*)"?(?:\s+WHERE\s+(.*?))?\s*;?\s*$"#
    )
    .expect("valid SELECT pattern");
    static ref CONDITION: Regex = Regex::new(
        r#"(?i)^"?([A-Za-z_][A-Za-z0-9_]*)"?\s*=\s*('(?:[^']|'')*'|-?\d+\.\d+(?:[eE][-+]?\d+)?|-?\d+|TRUE|FALSE|NULL)\s*"#
    )
    .expect("valid condition pattern");
    static ref AND: Regex = Regex::new(r"(?i)^AND\s+").expect("valid AND pattern");
}

pub fn quote_ident(ident: &str) -> String {
    let escaped = ident.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

pub fn format_value_for_sql(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string().to_uppercase(),
        Value::Text(s) => format!("'{}'", escape_sql_string(s)),
    }
}

fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Renders a filter as a `WHERE` clause, empty for a match-all filter.
pub fn where_clause(filter: &Filter) -> String {
    if filter.is_empty() {
        return String::new();
    }

    let conditions: Vec<String> = filter
        .conditions()
        .iter()
        .map(|(column, value)| match value {
            Value::Null => format!("{} IS NULL", quote_ident(column)),
            _ => format!("{} = {}", quote_ident(column), format_value_for_sql(value)),
        })
        .collect();

    format!(" WHERE {}", conditions.join(" AND "))
}

/// Builder for SELECT and COUNT statements
pub struct SelectStatementBuilder<'a> {
    table_name: &'a str,
    filter: Option<&'a Filter>,
    limit: Option<usize>,
    count: bool,
}

impl<'a> SelectStatementBuilder<'a> {
    pub fn new(table_name: &'a str) -> Self {
        Self {
            table_name,
            filter: None,
            limit: None,
            count: false,
        }
    }

    pub fn filter(mut self, filter: &'a Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn build(self) -> String {
        let projection = if self.count { "COUNT(*)" } else { "*" };
        let where_part = self.filter.map(where_clause).unwrap_or_default();
        let limit_part = self
            .limit
            .map(|n| format!(" LIMIT {}", n))
            .unwrap_or_default();

        format!(
            "SELECT {} FROM {}{}{}",
            projection,
            quote_ident(self.table_name),
            where_part,
            limit_part
        )
    }
}

/// Builder for single-row INSERT statements
pub struct InsertStatementBuilder<'a> {
    table_name: &'a str,
    fields: &'a FieldMap,
}

impl<'a> InsertStatementBuilder<'a> {
    pub fn new(table_name: &'a str, fields: &'a FieldMap) -> Self {
        Self { table_name, fields }
    }

    pub fn build(self) -> String {
        if self.fields.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(self.table_name));
        }

        let columns: Vec<String> = self.fields.keys().map(|c| quote_ident(c)).collect();
        let values: Vec<String> = self.fields.values().map(format_value_for_sql).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(self.table_name),
            columns.join(", "),
            values.join(", ")
        )
    }
}

/// Builder for UPDATE statements
pub struct UpdateStatementBuilder<'a> {
    table_name: &'a str,
    fields: &'a FieldMap,
    filter: Option<&'a Filter>,
}

impl<'a> UpdateStatementBuilder<'a> {
    pub fn new(table_name: &'a str, fields: &'a FieldMap) -> Self {
        Self {
            table_name,
            fields,
            filter: None,
        }
    }

    pub fn filter(mut self, filter: &'a Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn build(self) -> String {
        let set_parts: Vec<String> = self
            .fields
            .iter()
            .map(|(col, val)| format!("{} = {}", quote_ident(col), format_value_for_sql(val)))
            .collect();

        format!(
            "UPDATE {} SET {}{}",
            quote_ident(self.table_name),
            set_parts.join(", "),
            self.filter.map(where_clause).unwrap_or_default()
        )
    }
}

/// Parses `SELECT * FROM table [WHERE col = literal [AND ...]]` into the
/// table name and an equality filter.
pub fn parse_select(sql: &str) -> Result<(String, Filter)> {
    let caps = SELECT_ALL.captures(sql).ok_or_else(|| {
        DbError::UnsupportedOperation(format!("raw query not supported: {}", sql.trim()))
    })?;

    let table = caps[1].to_string();
    let mut filter = Filter::all();

    let Some(conditions) = caps.get(2) else {
        return Ok((table, filter));
    };

    let mut rest = conditions.as_str().trim();
    while !rest.is_empty() {
        let cond = CONDITION.captures(rest).ok_or_else(|| {
            DbError::ParseError(format!("unsupported WHERE condition near '{}'", rest))
        })?;
        filter = filter.and(&cond[1], parse_literal(&cond[2])?);
        rest = &rest[cond[0].len()..];

        if rest.is_empty() {
            break;
        }
        let and = AND.find(rest).ok_or_else(|| {
            DbError::ParseError(format!("expected AND near '{}'", rest))
        })?;
        rest = &rest[and.end()..];
    }

    Ok((table, filter))
}

fn parse_literal(literal: &str) -> Result<Value> {
    if let Some(quoted) = literal.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Ok(Value::Text(quoted.replace("''", "'")));
    }

    match literal.to_ascii_uppercase().as_str() {
        "TRUE" => return Ok(Value::Boolean(true)),
        "FALSE" => return Ok(Value::Boolean(false)),
        "NULL" => return Ok(Value::Null),
        _ => {}
    }

    if literal.contains(['.', 'e', 'E']) {
        literal
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| DbError::ParseError(format!("invalid number '{}': {}", literal, e)))
    } else {
        literal
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| DbError::ParseError(format!("invalid number '{}': {}", literal, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_builder() {
        let filter = Filter::by_id(3).and("name", "O'Brien");
        let sql = SelectStatementBuilder::new("user").filter(&filter).limit(1).build();
        assert_eq!(
            sql,
            r#"SELECT * FROM "user" WHERE "id" = 3 AND "name" = 'O''Brien' LIMIT 1"#
        );
    }

    #[test]
    fn test_count_builder_without_filter() {
        let sql = SelectStatementBuilder::new("order").count().build();
        assert_eq!(sql, r#"SELECT COUNT(*) FROM "order""#);
    }

    #[test]
    fn test_insert_and_update_builders() {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), Value::from("a"));
        fields.insert("active".into(), Value::Boolean(true));

        assert_eq!(
            InsertStatementBuilder::new("user", &fields).build(),
            r#"INSERT INTO "user" ("name", "active") VALUES ('a', TRUE)"#
        );

        let filter = Filter::by_id(7);
        assert_eq!(
            UpdateStatementBuilder::new("user", &fields).filter(&filter).build(),
            r#"UPDATE "user" SET "name" = 'a', "active" = TRUE WHERE "id" = 7"#
        );
    }

    #[test]
    fn test_parse_select_roundtrips_builder_output() {
        let filter = Filter::eq("name", "it's").and("score", 1.5).and("active", false);
        let sql = SelectStatementBuilder::new("user").filter(&filter).build();

        let (table, parsed) = parse_select(&sql).unwrap();
        assert_eq!(table, "user");
        assert_eq!(parsed, filter);
    }

    #[test]
    fn test_parse_select_plain() {
        let (table, filter) = parse_select("select * from order;").unwrap();
        assert_eq!(table, "order");
        assert!(filter.is_empty());

        let (_, filter) = parse_select("SELECT * FROM user WHERE age = -3 and nick = NULL").unwrap();
        assert_eq!(filter.conditions()["age"], Value::Integer(-3));
        assert!(filter.conditions()["nick"].is_null());
    }

    #[test]
    fn test_parse_select_rejects_other_shapes() {
        assert!(matches!(
            parse_select("DELETE FROM user"),
            Err(DbError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            parse_select("SELECT * FROM user WHERE age > 3"),
            Err(DbError::ParseError(_))
        ));
    }
}
