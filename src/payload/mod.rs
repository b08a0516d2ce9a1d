//! Normalized write trees.
//!
//! An [`EntityPayload`] describes one entity in a nested write request: its
//! type, how it is identified (durable id or temp id), the action requested,
//! its attributes, and the related entities riding along under each named
//! relationship. The surrounding framework builds these from a parsed
//! request document; the engine only sees the normalized tree.

use crate::core::{Action, Attributes, Identity, Result, WriteError};
use serde_json::Value;

/// Relationship data on one payload node: a single optional entity for
/// to-one relationships, a list for to-many.
#[derive(Debug, Clone)]
pub enum RelationData {
    One(Option<EntityPayload>),
    Many(Vec<EntityPayload>),
}

impl RelationData {
    /// Entities carried by this datum. An explicit `None` to-one datum is an
    /// empty set, not a detach; detaching takes an explicit disassociate.
    pub fn items(&self) -> Vec<&EntityPayload> {
        match self {
            RelationData::One(Some(payload)) => vec![payload],
            RelationData::One(None) => Vec::new(),
            RelationData::Many(items) => items.iter().collect(),
        }
    }
}

/// One node of a nested write request.
#[derive(Debug, Clone)]
pub struct EntityPayload {
    type_name: String,
    identity: Option<Identity>,
    action: Option<Action>,
    attributes: Attributes,
    relationships: Vec<(String, RelationData)>,
}

impl EntityPayload {
    /// Root payload with no explicit action: treated as a create when no
    /// durable id is present, an update otherwise.
    pub fn root(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            identity: None,
            action: None,
            attributes: Attributes::new(),
            relationships: Vec::new(),
        }
    }

    pub fn create(type_name: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Create),
            ..Self::root(type_name)
        }
    }

    /// Update payload; name the target with [`id`](Self::id) or
    /// [`temp_id`](Self::temp_id).
    pub fn update(type_name: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Update),
            ..Self::root(type_name)
        }
    }

    /// Destroy payload; name the target with [`id`](Self::id) or
    /// [`temp_id`](Self::temp_id).
    pub fn destroy(type_name: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Destroy),
            ..Self::root(type_name)
        }
    }

    /// Disassociate payload; name the target with [`id`](Self::id) or
    /// [`temp_id`](Self::temp_id).
    pub fn disassociate(type_name: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Disassociate),
            ..Self::root(type_name)
        }
    }

    /// Name this entity by a client-supplied temp id: the placeholder a
    /// create declares, or a reference to a record created earlier in the
    /// same request.
    pub fn temp_id(mut self, token: impl Into<String>) -> Self {
        self.identity = Some(Identity::temp(token));
        self
    }

    /// Name this entity by its durable id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.identity = Some(Identity::durable(id));
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn to_many(mut self, name: impl Into<String>, children: Vec<EntityPayload>) -> Self {
        self.relationships
            .push((name.into(), RelationData::Many(children)));
        self
    }

    pub fn to_one(mut self, name: impl Into<String>, child: EntityPayload) -> Self {
        self.relationships
            .push((name.into(), RelationData::One(Some(child))));
        self
    }

    /// Explicit `data: null` on a to-one relationship. Carries no entities
    /// and fires nothing; unlinking takes an explicit disassociate.
    pub fn to_one_null(mut self, name: impl Into<String>) -> Self {
        self.relationships.push((name.into(), RelationData::One(None)));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    /// The action to execute: the declared one, or create/update inferred
    /// from identity for an implicit root.
    pub fn effective_action(&self) -> Action {
        self.action.unwrap_or(match self.identity {
            Some(Identity::Durable(_)) => Action::Update,
            _ => Action::Create,
        })
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn relationships(&self) -> &[(String, RelationData)] {
        &self.relationships
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationData> {
        self.relationships
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }

    // ------------------------------------------------------------------
    // Well-formedness
    // ------------------------------------------------------------------

    /// Validate the whole tree before any persistence happens.
    ///
    /// The root may only create or update; nested entities must declare an
    /// action; a create must not name a durable id; update, destroy and
    /// disassociate need an identity; destroy/disassociate subtrees must be
    /// empty.
    pub fn validate_tree(&self) -> Result<()> {
        match self.effective_action() {
            Action::Create | Action::Update => {}
            other => {
                return Err(WriteError::MalformedPayload(format!(
                    "root entity '{}' may not declare action '{other}'",
                    self.type_name
                )));
            }
        }
        self.validate_node(true)
    }

    fn validate_node(&self, is_root: bool) -> Result<()> {
        if !is_root && self.action.is_none() {
            return Err(WriteError::MalformedPayload(format!(
                "nested entity '{}' must declare an action",
                self.type_name
            )));
        }

        match (self.effective_action(), &self.identity) {
            (Action::Create, Some(Identity::Durable(id))) => {
                return Err(WriteError::MalformedPayload(format!(
                    "create for '{}' must not reference durable id '{id}'",
                    self.type_name
                )));
            }
            (Action::Update | Action::Destroy | Action::Disassociate, None) => {
                return Err(WriteError::MalformedPayload(format!(
                    "{} for '{}' requires an id or temp-id",
                    self.effective_action(),
                    self.type_name
                )));
            }
            _ => {}
        }

        if matches!(
            self.effective_action(),
            Action::Destroy | Action::Disassociate
        ) && !self.relationships.is_empty()
        {
            return Err(WriteError::MalformedPayload(format!(
                "{} for '{}' may not carry nested relationships",
                self.effective_action(),
                self.type_name
            )));
        }

        for (_, data) in &self.relationships {
            for child in data.items() {
                child.validate_node(false)?;
            }
        }
        Ok(())
    }
}
