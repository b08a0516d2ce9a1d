// ============================================================================
// Sideload Library
// ============================================================================
//
// Nested-resource write engine for JSON:API-style persistence layers: one
// request payload describes a primary entity plus a tree of related entities,
// each tagged with an action (create/update/destroy/disassociate). The engine
// persists the tree in foreign-key dependency order, resolves temp-ids for
// records created within the request, partitions affected children into
// per-action groups, and fires relationship hooks with exactly those groups.
//
// Parsing request documents, authorization, and response rendering belong to
// the surrounding framework; storage is pluggable per resource type through
// the `ResourceStore` trait.

pub mod core;
pub mod executor;
pub mod payload;
pub mod resource;
pub mod result;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{ACTION_ORDER, Action, Attributes, Identity, Result, WriteError};
pub use executor::{ActionGroups, RequestContext, TempIdMap, WriteExecutor};
pub use payload::{EntityPayload, RelationData};
pub use resource::{
    Cardinality, ForeignKeySide, HookFilter, HookFn, Relationship, ResourceDef, SaveHook,
};
pub use result::WriteOutcome;
pub use storage::{MemoryStore, Record, ResourceStore};
