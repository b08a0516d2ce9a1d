//! Hook dispatch.
//!
//! After an entity and all of its relationship children are persisted, each
//! relationship's hooks fire with exactly the records that relationship
//! affected. Dispatch is deterministic: relationships in declaration order,
//! hooks within a relationship in registration order, multi-action filters
//! in canonical action order. A hook whose groups are empty never fires.

use super::relationship::ActionGroups;
use crate::core::ACTION_ORDER;
use crate::resource::{HookFilter, Relationship, ResourceDef};
use crate::storage::Record;
use log::debug;

/// Fire hooks for every relationship of `def` that produced groups this
/// request. `groups` is keyed by relationship name; a relationship absent
/// from it was absent from the payload and fires nothing.
pub(crate) fn fire_hooks(def: &ResourceDef, parent: &Record, groups: &[(String, ActionGroups)]) {
    for relationship in def.relationships() {
        let Some((_, rel_groups)) = groups.iter().find(|(name, _)| name == relationship.name())
        else {
            continue;
        };
        fire_relationship(relationship, parent, rel_groups);
    }
}

fn fire_relationship(relationship: &Relationship, parent: &Record, groups: &ActionGroups) {
    for hook in relationship.hooks() {
        match hook.filter() {
            HookFilter::Only(actions) => {
                for action in ACTION_ORDER.into_iter().filter(|a| actions.contains(a)) {
                    let group = groups.group(action);
                    if group.is_empty() {
                        continue;
                    }
                    debug!(
                        "firing {action} hook for relationship '{}' ({} record(s))",
                        relationship.name(),
                        group.len()
                    );
                    hook.callback()(parent, group);
                }
            }
            HookFilter::All => {
                let combined = groups.combined();
                if combined.is_empty() {
                    continue;
                }
                debug!(
                    "firing unfiltered hook for relationship '{}' ({} record(s))",
                    relationship.name(),
                    combined.len()
                );
                hook.callback()(parent, &combined);
            }
        }
    }
}
