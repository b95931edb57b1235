//! Read-only table catalog
//!
//! The pipeline never owns table metadata. It looks up the current logical
//! type of a column to decide how to coerce datetime/date values, and hands
//! the catalog to DDL translators so they can resolve existing columns.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Logical column type as far as event translation is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// Datetime/timestamp with `fraction` fractional-second digits
    DateTime { fraction: u32 },
    /// Calendar date
    Date,
    /// Binary/blob
    Binary,
    /// Anything else, by native type name
    Other { type_name: String },
}

impl FieldType {
    pub fn datetime(fraction: u32) -> Self {
        FieldType::DateTime { fraction }
    }

    pub fn other(type_name: impl Into<String>) -> Self {
        FieldType::Other {
            type_name: type_name.into(),
        }
    }
}

/// Current shape of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub fields: BTreeMap<String, FieldType>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_keys.push(name.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }
}

/// Read-only lookup from table name to its current schema.
pub trait TableCatalog: Send + Sync {
    fn table(&self, name: &str) -> Option<Arc<TableSchema>>;

    /// Look up one field of one table.
    fn field_type(&self, table: &str, field: &str) -> Option<FieldType> {
        self.table(table)
            .and_then(|schema| schema.field(field).cloned())
    }
}

/// In-memory catalog, populated by the embedding application.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, schema: TableSchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&self, schema: TableSchema) {
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(schema.name.clone(), Arc::new(schema));
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableCatalog for MemoryCatalog {
    fn table(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}
