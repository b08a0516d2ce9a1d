//! Per-relationship child persistence and action grouping.
//!
//! One relationship on one parent is processed child by child: each child is
//! persisted according to its declared action, foreign keys are wired in the
//! direction the descriptor dictates, and the resulting records land in the
//! action group matching the action that produced them.

use super::context::RequestContext;
use super::write::WriteExecutor;
use crate::core::{ACTION_ORDER, Action, Attributes, Identity, Result, WriteError};
use crate::payload::{EntityPayload, RelationData};
use crate::resource::{Cardinality, Relationship};
use crate::storage::Record;
use log::debug;
use serde_json::Value;

/// Records affected by one relationship in one request, partitioned by the
/// action that produced them. Order within a group follows payload order.
#[derive(Debug, Default, Clone)]
pub struct ActionGroups {
    create: Vec<Record>,
    update: Vec<Record>,
    destroy: Vec<Record>,
    disassociate: Vec<Record>,
}

impl ActionGroups {
    pub fn push(&mut self, action: Action, record: Record) {
        match action {
            Action::Create => self.create.push(record),
            Action::Update => self.update.push(record),
            Action::Destroy => self.destroy.push(record),
            Action::Disassociate => self.disassociate.push(record),
        }
    }

    pub fn group(&self, action: Action) -> &[Record] {
        match action {
            Action::Create => &self.create,
            Action::Update => &self.update,
            Action::Destroy => &self.destroy,
            Action::Disassociate => &self.disassociate,
        }
    }

    /// Every affected record across all groups, concatenated in canonical
    /// action order: create, update, destroy, disassociate.
    pub fn combined(&self) -> Vec<Record> {
        ACTION_ORDER
            .iter()
            .flat_map(|action| self.group(*action).iter().cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        ACTION_ORDER.iter().all(|action| self.group(*action).is_empty())
    }
}

impl WriteExecutor {
    /// Process a relationship whose foreign key lives on the parent
    /// (belongs-to). Children persist before the parent; the parent's key
    /// attribute is accumulated into `patch` and written when the parent
    /// saves. Destroy and disassociate null the parent's key.
    pub(crate) async fn process_parent_keyed(
        &self,
        relationship: &Relationship,
        data: &RelationData,
        patch: &mut Attributes,
        ctx: &mut RequestContext,
    ) -> Result<ActionGroups> {
        let children = checked_items(relationship, data)?;
        let mut groups = ActionGroups::default();
        let foreign_key = relationship.foreign_key();
        let store = relationship.resource().store();

        for child in children {
            let action = child.effective_action();
            match action {
                Action::Create | Action::Update => {
                    let record = self
                        .persist_tree(relationship.resource(), child, Attributes::new(), ctx)
                        .await?;
                    // Resolve through the temp-id table when the payload named
                    // one, so a stale or duplicate token surfaces here.
                    let durable = match child.identity() {
                        Some(Identity::Temp(token)) => ctx.temp_ids().resolve(token)?,
                        _ => record.id.clone(),
                    };
                    patch.insert(foreign_key.to_string(), Value::String(durable));
                    groups.push(action, record);
                }
                Action::Destroy => {
                    let id = durable_id_of(child, ctx)?;
                    let record = store.destroy(&id).await?;
                    debug!("destroyed {} id={id}", child.type_name());
                    // The referenced row is gone; the parent must not keep
                    // pointing at it.
                    patch.insert(foreign_key.to_string(), Value::Null);
                    groups.push(Action::Destroy, record);
                }
                Action::Disassociate => {
                    let id = durable_id_of(child, ctx)?;
                    let record = store.fetch(&id).await?;
                    patch.insert(foreign_key.to_string(), Value::Null);
                    groups.push(Action::Disassociate, record);
                }
            }
        }
        Ok(groups)
    }

    /// Process a relationship whose foreign key lives on each child
    /// (has-many / has-one). Children persist after the parent, with the
    /// parent's durable id injected into their attributes; disassociate
    /// persists the child with the key nulled instead.
    pub(crate) async fn process_child_keyed(
        &self,
        relationship: &Relationship,
        data: &RelationData,
        parent: &Record,
        ctx: &mut RequestContext,
    ) -> Result<ActionGroups> {
        let children = checked_items(relationship, data)?;
        let mut groups = ActionGroups::default();
        let foreign_key = relationship.foreign_key();
        let store = relationship.resource().store();

        for child in children {
            let action = child.effective_action();
            match action {
                Action::Create | Action::Update => {
                    let mut extra = Attributes::new();
                    extra.insert(
                        foreign_key.to_string(),
                        Value::String(parent.id.clone()),
                    );
                    let record = self
                        .persist_tree(relationship.resource(), child, extra, ctx)
                        .await?;
                    groups.push(action, record);
                }
                Action::Destroy => {
                    let id = durable_id_of(child, ctx)?;
                    let record = store.destroy(&id).await?;
                    debug!("destroyed {} id={id}", child.type_name());
                    groups.push(Action::Destroy, record);
                }
                Action::Disassociate => {
                    let id = durable_id_of(child, ctx)?;
                    let mut unlink = Attributes::new();
                    unlink.insert(foreign_key.to_string(), Value::Null);
                    let record = store.update(&id, unlink).await?;
                    debug!("disassociated {} id={id} from '{}'", child.type_name(), relationship.name());
                    groups.push(Action::Disassociate, record);
                }
            }
        }
        Ok(groups)
    }
}

/// Children carried by the payload datum, after checking that its shape
/// agrees with the descriptor's cardinality and that every child names the
/// descriptor's resource type.
fn checked_items<'a>(
    relationship: &Relationship,
    data: &'a RelationData,
) -> Result<Vec<&'a EntityPayload>> {
    match (relationship.cardinality(), data) {
        (Cardinality::ToOne, RelationData::Many(_)) => {
            return Err(WriteError::MalformedPayload(format!(
                "relationship '{}' is to-one but the payload carries a list",
                relationship.name()
            )));
        }
        (Cardinality::ToMany, RelationData::One(_)) => {
            return Err(WriteError::MalformedPayload(format!(
                "relationship '{}' is to-many but the payload carries a single entity",
                relationship.name()
            )));
        }
        _ => {}
    }

    let items = data.items();
    let expected = relationship.resource().type_name();
    for child in &items {
        if child.type_name() != expected {
            return Err(WriteError::MalformedPayload(format!(
                "relationship '{}' persists '{expected}' but the payload names '{}'",
                relationship.name(),
                child.type_name()
            )));
        }
    }
    Ok(items)
}

/// Durable id of an already-persisted entity, resolving temp ids through the
/// request table.
pub(crate) fn durable_id_of(payload: &EntityPayload, ctx: &RequestContext) -> Result<String> {
    match payload.identity() {
        Some(Identity::Durable(id)) => Ok(id.clone()),
        Some(Identity::Temp(token)) => ctx.temp_ids().resolve(token),
        None => Err(WriteError::MalformedPayload(format!(
            "{} for '{}' requires an id or temp-id",
            payload.effective_action(),
            payload.type_name()
        ))),
    }
}
