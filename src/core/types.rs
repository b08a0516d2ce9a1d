use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute map of a record or payload node. Values are plain JSON; a JSON
/// null clears the named attribute (used for foreign-key unlinking).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// The mutation requested for one entity in a write payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Destroy,
    Disassociate,
}

/// Canonical action order. Concatenated hook arguments and multi-action
/// filters always iterate in this order.
pub const ACTION_ORDER: [Action; 4] = [
    Action::Create,
    Action::Update,
    Action::Destroy,
    Action::Disassociate,
];

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Disassociate => "disassociate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payload node names its entity: an already-persisted durable id, or a
/// client-supplied temp id standing in for a record created in this request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Durable(String),
    Temp(String),
}

impl Identity {
    pub fn durable(id: impl Into<String>) -> Self {
        Identity::Durable(id.into())
    }

    pub fn temp(token: impl Into<String>) -> Self {
        Identity::Temp(token.into())
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Identity::Temp(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Durable(id) => write!(f, "id={id}"),
            Identity::Temp(token) => write!(f, "temp-id={token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_order_is_create_update_destroy_disassociate() {
        let tags: Vec<&str> = ACTION_ORDER.iter().map(|a| a.as_str()).collect();
        assert_eq!(tags, ["create", "update", "destroy", "disassociate"]);
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Action::Disassociate).unwrap(),
            "\"disassociate\""
        );
    }
}
