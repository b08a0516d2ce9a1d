//! Static resource configuration.
//!
//! A [`ResourceDef`] couples a resource type with its storage collaborator
//! and its relationship descriptors. Descriptors carry the wiring facts the
//! engine needs (foreign key name, cardinality, which side owns the key, the
//! child resource) plus an ordered list of after-save hooks with action
//! filters. Definitions are configuration, built once and shared; all
//! per-request state lives elsewhere.

use crate::core::Action;
use crate::storage::{Record, ResourceStore};
use std::fmt;
use std::sync::Arc;

/// How many related entities a relationship carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Which side of the relationship holds the foreign key.
///
/// `Parent` is the belongs-to shape (the key lives on the parent row and
/// must be resolved before the parent persists); `Child` is the
/// has-many/has-one shape (each child row points back at the parent and
/// persists after it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeySide {
    Parent,
    Child,
}

/// Which action groups a hook wants to see.
#[derive(Clone)]
pub enum HookFilter {
    /// Fire once per listed action whose group is non-empty.
    Only(Vec<Action>),
    /// Fire once with every affected child across all actions.
    All,
}

impl fmt::Debug for HookFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookFilter::Only(actions) => write!(f, "only {actions:?}"),
            HookFilter::All => write!(f, "all"),
        }
    }
}

/// Hook callback: receives the parent record and the affected children for
/// the matching group. Callbacks are synchronous side effects.
pub type HookFn = dyn Fn(&Record, &[Record]) + Send + Sync;

/// One registered after-save hook on a relationship.
#[derive(Clone)]
pub struct SaveHook {
    filter: HookFilter,
    callback: Arc<HookFn>,
}

impl SaveHook {
    pub fn filter(&self) -> &HookFilter {
        &self.filter
    }

    pub fn callback(&self) -> &HookFn {
        self.callback.as_ref()
    }
}

/// Descriptor for one named relationship on a resource.
#[derive(Clone)]
pub struct Relationship {
    name: String,
    foreign_key: String,
    cardinality: Cardinality,
    fk_side: ForeignKeySide,
    resource: Arc<ResourceDef>,
    hooks: Vec<SaveHook>,
}

impl Relationship {
    /// To-many relationship whose children carry the foreign key.
    pub fn has_many(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        resource: Arc<ResourceDef>,
    ) -> Self {
        Self::new(name, foreign_key, Cardinality::ToMany, ForeignKeySide::Child, resource)
    }

    /// To-one relationship whose key lives on the parent row.
    pub fn belongs_to(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        resource: Arc<ResourceDef>,
    ) -> Self {
        Self::new(name, foreign_key, Cardinality::ToOne, ForeignKeySide::Parent, resource)
    }

    /// To-one relationship whose key lives on the child row.
    pub fn has_one(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        resource: Arc<ResourceDef>,
    ) -> Self {
        Self::new(name, foreign_key, Cardinality::ToOne, ForeignKeySide::Child, resource)
    }

    fn new(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        cardinality: Cardinality,
        fk_side: ForeignKeySide,
        resource: Arc<ResourceDef>,
    ) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            cardinality,
            fk_side,
            resource,
            hooks: Vec::new(),
        }
    }

    /// Register an after-save hook that fires for every action.
    pub fn after_save<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Record, &[Record]) + Send + Sync + 'static,
    {
        self.hooks.push(SaveHook {
            filter: HookFilter::All,
            callback: Arc::new(callback),
        });
        self
    }

    /// Register an after-save hook limited to the given actions. The
    /// callback fires once per listed action that actually affected records,
    /// in canonical action order.
    pub fn after_save_only<A, F>(mut self, actions: A, callback: F) -> Self
    where
        A: IntoIterator<Item = Action>,
        F: Fn(&Record, &[Record]) + Send + Sync + 'static,
    {
        self.hooks.push(SaveHook {
            filter: HookFilter::Only(actions.into_iter().collect()),
            callback: Arc::new(callback),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn fk_side(&self) -> ForeignKeySide {
        self.fk_side
    }

    pub fn resource(&self) -> &Arc<ResourceDef> {
        &self.resource
    }

    pub fn hooks(&self) -> &[SaveHook] {
        &self.hooks
    }
}

/// Definition of one resource type: its storage collaborator plus its
/// relationship descriptors, in declaration order.
pub struct ResourceDef {
    type_name: String,
    store: Arc<dyn ResourceStore>,
    relationships: Vec<Relationship>,
}

impl ResourceDef {
    pub fn new(type_name: impl Into<String>, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            type_name: type_name.into(),
            store,
            relationships: Vec::new(),
        }
    }

    /// Add a relationship descriptor. Declaration order is hook dispatch
    /// order across relationships.
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship_named(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name() == name)
    }
}
