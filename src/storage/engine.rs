use super::Record;
use crate::core::{Attributes, Result};
use async_trait::async_trait;

/// Storage collaborator for one resource type - allows pluggable backends.
///
/// The write engine drives all persistence through this trait and never
/// touches the backing store directly. Foreign keys are set or cleared by
/// writing the named attribute (a string id, or JSON null to unlink) into the
/// map handed to [`create`](ResourceStore::create) or
/// [`update`](ResourceStore::update); the store decides how that maps onto
/// its row format.
///
/// Transactional wrapping is the backend's concern: the engine assumes an
/// all-or-nothing commit boundary around one request and aborts on the first
/// error without compensating earlier writes.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persist a new record, returning it with its assigned durable id.
    /// Validation failures surface as [`WriteError::Validation`].
    ///
    /// [`WriteError::Validation`]: crate::core::WriteError::Validation
    async fn create(&self, attributes: Attributes) -> Result<Record>;

    /// Apply attributes to an existing record and return the updated state.
    async fn update(&self, id: &str, attributes: Attributes) -> Result<Record>;

    /// Remove a record, returning its pre-destruction snapshot.
    async fn destroy(&self, id: &str) -> Result<Record>;

    /// Load a record by durable id.
    async fn fetch(&self, id: &str) -> Result<Record>;
}
