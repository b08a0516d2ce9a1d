use crate::core::{Result, WriteError};
use std::collections::HashMap;

/// Request-scoped table mapping client temp ids to the durable ids assigned
/// at persistence. Passed through the walk explicitly so concurrent requests
/// never share state.
#[derive(Debug, Default)]
pub struct TempIdMap {
    assigned: HashMap<String, String>,
}

impl TempIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a temp id to the durable id its entity received. Re-registering
    /// the same pair is idempotent; a different durable id for an already
    /// bound temp id is a malformed payload.
    pub fn register(&mut self, temp_id: &str, durable_id: &str) -> Result<()> {
        if let Some(existing) = self.assigned.get(temp_id) {
            if existing != durable_id {
                return Err(WriteError::DuplicateTempId {
                    temp_id: temp_id.to_string(),
                    existing: existing.clone(),
                });
            }
            return Ok(());
        }
        self.assigned.insert(temp_id.to_string(), durable_id.to_string());
        Ok(())
    }

    /// Durable id previously registered for `temp_id`. Stable for the rest
    /// of the request once assigned.
    pub fn resolve(&self, temp_id: &str) -> Result<String> {
        self.assigned
            .get(temp_id)
            .cloned()
            .ok_or_else(|| WriteError::UnresolvedTempId(temp_id.to_string()))
    }
}

/// Per-request state threaded through the persistence walk.
#[derive(Debug, Default)]
pub struct RequestContext {
    temp_ids: TempIdMap,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temp_ids(&self) -> &TempIdMap {
        &self.temp_ids
    }

    pub fn temp_ids_mut(&mut self) -> &mut TempIdMap {
        &mut self.temp_ids
    }
}
