use super::Record;
use crate::config::ModelConfig;
use crate::core::{FieldKind, ModelSchema, Value};
use crate::gateway::ID_COLUMN;
use crate::projection::ProjectionRule;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Computed read of a named attribute.
pub type Accessor = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Computed write of a named attribute.
pub type Mutator = Arc<dyn Fn(&mut Record, Value) + Send + Sync>;

/// Number of trailing characters of a type name that mark it as a record
/// type (`UserModel` → `user`).
pub const RECORD_TYPE_SUFFIX_LEN: usize = 5;

/// Derives a table name from a record type name: lower-cased, namespace
/// stripped, record-type suffix removed.
pub fn table_name_for(type_name: &str) -> String {
    let lower = type_name.to_lowercase();
    let base = lower.rsplit(['\\', '/', ':']).next().unwrap_or_default();
    let keep = base.chars().count().saturating_sub(RECORD_TYPE_SUFFIX_LEN);
    base.chars().take(keep).collect()
}

/// Everything records of one concrete type share: the schema used for
/// coercion, export rules, computed attributes and configuration.
///
/// Immutable once built and shared through `Arc`.
pub struct ModelMeta {
    type_name: String,
    table_name: String,
    schema: ModelSchema,
    projection: Vec<ProjectionRule>,
    accessors: HashMap<String, Accessor>,
    mutators: HashMap<String, Mutator>,
    config: ModelConfig,
}

impl ModelMeta {
    pub fn builder(type_name: impl Into<String>) -> ModelMetaBuilder {
        ModelMetaBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn projection(&self) -> &[ProjectionRule] {
        &self.projection
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn accessor(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    pub fn mutator(&self, name: &str) -> Option<&Mutator> {
        self.mutators.get(name)
    }

    /// Columns of the backing table: the declared fields plus `id`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![ID_COLUMN.to_string()];
        columns.extend(
            self.schema
                .keys()
                .filter(|name| name.as_str() != ID_COLUMN)
                .cloned(),
        );
        columns
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&String> = self.accessors.keys().collect();
        accessors.sort();
        let mut mutators: Vec<&String> = self.mutators.keys().collect();
        mutators.sort();

        f.debug_struct("ModelMeta")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("schema", &self.schema)
            .field("projection", &self.projection)
            .field("accessors", &accessors)
            .field("mutators", &mutators)
            .field("config", &self.config)
            .finish()
    }
}

pub struct ModelMetaBuilder {
    meta: ModelMeta,
}

impl ModelMetaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            meta: ModelMeta {
                table_name: table_name_for(&type_name),
                type_name,
                schema: ModelSchema::new(),
                projection: Vec::new(),
                accessors: HashMap::new(),
                mutators: HashMap::new(),
                config: ModelConfig::default(),
            },
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.meta.schema.insert(name.into(), kind);
        self
    }

    /// Declares a field by type tag (`"int"`, `"datetime"`, ...).
    pub fn field_tag(self, name: impl Into<String>, tag: &str) -> Self {
        self.field(name, FieldKind::from_tag(tag))
    }

    /// Adds a `+name` / `-name` export directive. Unsigned directives are
    /// ignored.
    pub fn export(mut self, directive: &str) -> Self {
        match ProjectionRule::parse(directive) {
            Some(rule) => self.meta.projection.push(rule),
            None => warn!(
                model = %self.meta.type_name,
                directive,
                "ignoring export directive without +/- marker"
            ),
        }
        self
    }

    pub fn accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.meta.accessors.insert(name.into(), Arc::new(accessor));
        self
    }

    pub fn mutator<F>(mut self, name: impl Into<String>, mutator: F) -> Self
    where
        F: Fn(&mut Record, Value) + Send + Sync + 'static,
    {
        self.meta.mutators.insert(name.into(), Arc::new(mutator));
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.meta.config = config;
        self
    }

    pub fn build(self) -> Arc<ModelMeta> {
        Arc::new(self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_derivation() {
        assert_eq!(table_name_for("OrderModel"), "order");
        assert_eq!(table_name_for("App\\OrderModel"), "order");
        assert_eq!(table_name_for("app::models::UserModel"), "user");
        assert_eq!(table_name_for("Model"), "");
        assert_eq!(table_name_for("Tiny"), "");
    }

    #[test]
    fn test_builder() {
        let meta = ModelMeta::builder("Shop\\ProductModel")
            .field("name", FieldKind::Text)
            .field_tag("price", "double")
            .export("+label")
            .export("label")
            .accessor("label", |r| r.get("name"))
            .build();

        assert_eq!(meta.type_name(), "Shop\\ProductModel");
        assert_eq!(meta.table_name(), "product");
        assert_eq!(meta.schema()["price"], FieldKind::Float);
        assert_eq!(meta.projection(), &[ProjectionRule::Include("label".into())]);
        assert!(meta.accessor("label").is_some());
        assert!(meta.mutator("label").is_none());
        assert_eq!(meta.columns(), vec!["id", "name", "price"]);
    }
}
