use super::{Record, ResourceStore};
use crate::core::{Attributes, Result, WriteError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Attribute validator run before every create and update. Returns the list
/// of violation messages; an empty `Ok(())` admits the write.
pub type Validator = dyn Fn(&Attributes) -> std::result::Result<(), Vec<String>> + Send + Sync;

struct StoredRow {
    attributes: Attributes,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// In-memory [`ResourceStore`] for one resource type.
///
/// Durable ids are UUID v4 strings. Updates are attribute patches: supplied
/// keys overwrite, absent keys are left alone, explicit JSON nulls are stored
/// as nulls (which is how foreign keys are cleared). `created_at` and
/// `updated_at` timestamps are surfaced as record attributes.
///
/// This is the development and test backend; production callers plug their
/// own [`ResourceStore`] implementations into resource definitions.
pub struct MemoryStore {
    type_name: String,
    rows: Arc<RwLock<BTreeMap<String, StoredRow>>>,
    validator: Option<Arc<Validator>>,
}

impl MemoryStore {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            validator: None,
        }
    }

    /// Attach an attribute validator applied on every create and update.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Attributes) -> std::result::Result<(), Vec<String>> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Snapshot every stored record (development and test convenience; not
    /// part of the [`ResourceStore`] surface the engine drives).
    pub async fn all(&self) -> Vec<Record> {
        let rows = self.rows.read().await;
        rows.iter().map(|(id, row)| self.record_for(id, row)).collect()
    }

    fn check(&self, attributes: &Attributes) -> Result<()> {
        if let Some(validator) = self.validator.as_deref() {
            if let Err(messages) = validator(attributes) {
                return Err(WriteError::Validation {
                    entity_type: self.type_name.clone(),
                    messages,
                });
            }
        }
        Ok(())
    }

    fn record_for(&self, id: &str, row: &StoredRow) -> Record {
        let mut attributes = row.attributes.clone();
        attributes.insert(
            "created_at".into(),
            Value::String(row.created_at.to_rfc3339()),
        );
        attributes.insert(
            "updated_at".into(),
            Value::String(row.updated_at.to_rfc3339()),
        );
        Record::new(id, &self.type_name, attributes)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn create(&self, attributes: Attributes) -> Result<Record> {
        self.check(&attributes)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let row = StoredRow {
            attributes,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().await;
        let record = self.record_for(&id, &row);
        rows.insert(id, row);
        Ok(record)
    }

    async fn update(&self, id: &str, attributes: Attributes) -> Result<Record> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| WriteError::not_found(&self.type_name, id))?;

        // Validate the would-be merged state, not the bare patch.
        let mut merged = row.attributes.clone();
        for (key, value) in attributes {
            merged.insert(key, value);
        }
        self.check(&merged)?;

        row.attributes = merged;
        row.updated_at = Utc::now();
        Ok(self.record_for(id, row))
    }

    async fn destroy(&self, id: &str) -> Result<Record> {
        let mut rows = self.rows.write().await;
        let row = rows
            .remove(id)
            .ok_or_else(|| WriteError::not_found(&self.type_name, id))?;
        Ok(self.record_for(id, &row))
    }

    async fn fetch(&self, id: &str) -> Result<Record> {
        let rows = self.rows.read().await;
        let row = rows
            .get(id)
            .ok_or_else(|| WriteError::not_found(&self.type_name, id))?;
        Ok(self.record_for(id, row))
    }
}
