//! Entity persistence
//!
//! Factories only ever call into an [`EntityStore`]. [`MemoryStore`] keeps
//! tables in memory, which is what tests and in-process seeding use.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

use crate::attributes::Attributes;
use crate::entity::Entity;
use crate::error::{FactoryError, FactoryResult};

/// Persistence collaborator used by factories
pub trait EntityStore: Send + Sync {
    /// Persist the entity, assigning a key when it has none
    fn insert(&self, entity: &mut Entity) -> FactoryResult<()>;

    /// Insert a pivot record into a many-to-many junction table
    fn attach(&self, table: &str, record: Attributes) -> FactoryResult<()>;

    /// Look up an entity by model name and key
    fn find(&self, model: &str, key: &Value) -> FactoryResult<Option<Entity>>;
}

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Entity>>,
    pivots: HashMap<String, Vec<Attributes>>,
    next_keys: HashMap<String, i64>,
}

/// In-memory store with auto-incrementing integer keys per model
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored entities of a model, in insertion order
    pub fn all(&self, model: &str) -> Vec<Entity> {
        self.tables
            .lock()
            .rows
            .get(model)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, model: &str) -> usize {
        self.tables.lock().rows.get(model).map(Vec::len).unwrap_or(0)
    }

    /// Most recently inserted entity of a model
    pub fn latest(&self, model: &str) -> Option<Entity> {
        self.tables
            .lock()
            .rows
            .get(model)
            .and_then(|rows| rows.last().cloned())
    }

    /// Entities of `model` whose `field` equals `value`
    pub fn where_eq(&self, model: &str, field: &str, value: &Value) -> Vec<Entity> {
        self.all(model)
            .into_iter()
            .filter(|entity| entity.get(field) == Some(value))
            .collect()
    }

    /// Pivot records of a junction table, in attachment order
    pub fn pivots(&self, table: &str) -> Vec<Attributes> {
        self.tables
            .lock()
            .pivots
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every row and pivot record
    pub fn truncate(&self) {
        *self.tables.lock() = Tables::default();
    }
}

impl EntityStore for MemoryStore {
    fn insert(&self, entity: &mut Entity) -> FactoryResult<()> {
        let mut tables = self.tables.lock();

        if entity.key().is_none() {
            let next = tables.next_keys.entry(entity.model().to_string()).or_insert(0);
            *next += 1;
            entity.set_key(Value::from(*next));
        } else {
            let duplicate = tables
                .rows
                .get(entity.model())
                .map(|rows| rows.iter().any(|row| row.key() == entity.key()))
                .unwrap_or(false);
            if duplicate {
                return Err(FactoryError::Persistence(format!(
                    "Duplicate key {} for model [{}]",
                    entity.key_value(),
                    entity.model()
                )));
            }
            if let Some(key) = entity.key().and_then(Value::as_i64) {
                let next = tables.next_keys.entry(entity.model().to_string()).or_insert(0);
                *next = (*next).max(key);
            }
        }

        entity.set_exists(true);
        tables
            .rows
            .entry(entity.model().to_string())
            .or_default()
            .push(entity.clone());

        tracing::trace!("Stored {} with key {}", entity.model(), entity.key_value());
        Ok(())
    }

    fn attach(&self, table: &str, record: Attributes) -> FactoryResult<()> {
        if table.is_empty() {
            return Err(FactoryError::Persistence(
                "Pivot table name cannot be empty".to_string(),
            ));
        }

        tracing::trace!("Attached pivot record to {}", table);
        self.tables
            .lock()
            .pivots
            .entry(table.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    fn find(&self, model: &str, key: &Value) -> FactoryResult<Option<Entity>> {
        Ok(self
            .tables
            .lock()
            .rows
            .get(model)
            .and_then(|rows| rows.iter().find(|row| row.key() == Some(key)).cloned()))
    }
}
