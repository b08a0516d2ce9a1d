//! The persistence orchestrator.
//!
//! [`WriteExecutor::process`] is the single entry point: it validates the
//! payload tree, persists it in foreign-key dependency order, and dispatches
//! relationship hooks with the action groups the walk produced.
//!
//! Ordering per entity:
//! 1. relationships whose key lives on the parent (children first, key
//!    patched onto the parent),
//! 2. the entity itself (create or update, patch merged over attributes),
//! 3. relationships whose key lives on the children (parent id injected),
//! 4. hook dispatch in relationship declaration order.
//!
//! The walk recurses depth-first: a child with its own nested relationships
//! runs all four steps (including its own hook dispatch) before it joins the
//! parent's groups.

use super::context::RequestContext;
use super::dispatch;
use super::relationship::{ActionGroups, durable_id_of};
use crate::core::{Action, Attributes, Identity, Result, WriteError};
use crate::payload::EntityPayload;
use crate::resource::{ForeignKeySide, ResourceDef};
use crate::result::WriteOutcome;
use crate::storage::Record;
use async_recursion::async_recursion;
use log::debug;
use std::sync::Arc;

pub struct WriteExecutor {
    root: Arc<ResourceDef>,
}

impl WriteExecutor {
    pub fn new(root: Arc<ResourceDef>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<ResourceDef> {
        &self.root
    }

    /// Apply one nested write request.
    ///
    /// Returns `Ok` with `success == false` only when the storage
    /// collaborator rejects the root entity's own validation; every other
    /// failure anywhere in the tree aborts with an error and leaves the
    /// surrounding transaction to roll back what was already written.
    ///
    /// # Examples
    ///
    /// ```
    /// use sideload::{EntityPayload, MemoryStore, Relationship, ResourceDef, WriteExecutor};
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let books = Arc::new(ResourceDef::new("books", Arc::new(MemoryStore::new("books"))));
    /// let authors = Arc::new(
    ///     ResourceDef::new("authors", Arc::new(MemoryStore::new("authors")))
    ///         .relationship(Relationship::has_many("books", "author_id", books)),
    /// );
    ///
    /// let executor = WriteExecutor::new(authors);
    /// let payload = EntityPayload::root("authors")
    ///     .attr("first_name", "Stephen")
    ///     .to_many("books", vec![
    ///         EntityPayload::create("books").attr("title", "one"),
    ///     ]);
    ///
    /// let outcome = executor.process(&payload).await.unwrap();
    /// assert!(outcome.success());
    /// # });
    /// ```
    pub async fn process(&self, payload: &EntityPayload) -> Result<WriteOutcome> {
        if payload.type_name() != self.root.type_name() {
            return Err(WriteError::MalformedPayload(format!(
                "payload names '{}' but this executor persists '{}'",
                payload.type_name(),
                self.root.type_name()
            )));
        }
        payload.validate_tree()?;

        let mut ctx = RequestContext::new();
        let (patch, mut groups) = self
            .relationships_before_save(&self.root, payload, &mut ctx)
            .await?;

        let record = match self.save_entity(&self.root, payload, patch, &mut ctx).await {
            Ok(record) => record,
            Err(WriteError::Validation { entity_type, messages }) => {
                debug!("root {entity_type} failed validation; no hooks fired");
                return Ok(WriteOutcome::invalid(messages));
            }
            Err(err) => return Err(err),
        };

        let after = self
            .relationships_after_save(&self.root, payload, &record, &mut ctx)
            .await?;
        groups.extend(after);

        dispatch::fire_hooks(&self.root, &record, &groups);
        Ok(WriteOutcome::persisted(record))
    }

    /// Persist one subtree: the entity plus everything nested under it.
    /// Used for create/update children; destroy and disassociate never
    /// recurse.
    #[async_recursion]
    pub(crate) async fn persist_tree(
        &self,
        def: &Arc<ResourceDef>,
        payload: &EntityPayload,
        extra: Attributes,
        ctx: &mut RequestContext,
    ) -> Result<Record> {
        let (mut patch, mut groups) = self.relationships_before_save(def, payload, ctx).await?;
        // Keys injected by the parent (has-many direction) win over anything
        // the subtree produced.
        for (key, value) in extra {
            patch.insert(key, value);
        }

        let record = self.save_entity(def, payload, patch, ctx).await?;

        let after = self
            .relationships_after_save(def, payload, &record, ctx)
            .await?;
        groups.extend(after);

        dispatch::fire_hooks(def, &record, &groups);
        Ok(record)
    }

    async fn relationships_before_save(
        &self,
        def: &Arc<ResourceDef>,
        payload: &EntityPayload,
        ctx: &mut RequestContext,
    ) -> Result<(Attributes, Vec<(String, ActionGroups)>)> {
        verify_relationship_names(def, payload)?;

        let mut patch = Attributes::new();
        let mut groups = Vec::new();
        for relationship in def
            .relationships()
            .iter()
            .filter(|r| r.fk_side() == ForeignKeySide::Parent)
        {
            let Some(data) = payload.relationship(relationship.name()) else {
                continue;
            };
            let produced = self
                .process_parent_keyed(relationship, data, &mut patch, ctx)
                .await?;
            groups.push((relationship.name().to_string(), produced));
        }
        Ok((patch, groups))
    }

    async fn relationships_after_save(
        &self,
        def: &Arc<ResourceDef>,
        payload: &EntityPayload,
        parent: &Record,
        ctx: &mut RequestContext,
    ) -> Result<Vec<(String, ActionGroups)>> {
        let mut groups = Vec::new();
        for relationship in def
            .relationships()
            .iter()
            .filter(|r| r.fk_side() == ForeignKeySide::Child)
        {
            let Some(data) = payload.relationship(relationship.name()) else {
                continue;
            };
            let produced = self
                .process_child_keyed(relationship, data, parent, ctx)
                .await?;
            groups.push((relationship.name().to_string(), produced));
        }
        Ok(groups)
    }

    async fn save_entity(
        &self,
        def: &Arc<ResourceDef>,
        payload: &EntityPayload,
        patch: Attributes,
        ctx: &mut RequestContext,
    ) -> Result<Record> {
        let mut attributes = payload.attributes().clone();
        for (key, value) in patch {
            attributes.insert(key, value);
        }

        match payload.effective_action() {
            Action::Create => {
                let record = def.store().create(attributes).await?;
                if let Some(Identity::Temp(token)) = payload.identity() {
                    ctx.temp_ids_mut().register(token, &record.id)?;
                }
                debug!("created {} id={}", def.type_name(), record.id);
                Ok(record)
            }
            Action::Update => {
                let id = durable_id_of(payload, ctx)?;
                let record = def.store().update(&id, attributes).await?;
                debug!("updated {} id={}", def.type_name(), record.id);
                Ok(record)
            }
            other => Err(WriteError::MalformedPayload(format!(
                "entity '{}' cannot persist with action '{other}'",
                payload.type_name()
            ))),
        }
    }
}

fn verify_relationship_names(def: &ResourceDef, payload: &EntityPayload) -> Result<()> {
    for (name, _) in payload.relationships() {
        if def.relationship_named(name).is_none() {
            return Err(WriteError::MalformedPayload(format!(
                "unknown relationship '{name}' on resource '{}'",
                def.type_name()
            )));
        }
    }
    Ok(())
}
