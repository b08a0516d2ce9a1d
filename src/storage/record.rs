use crate::core::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of one persisted record as returned by a [`ResourceStore`].
///
/// For destroyed records this is the pre-destruction state; hook callbacks
/// receive it even though the backing row is gone.
///
/// [`ResourceStore`]: crate::storage::ResourceStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub type_name: String,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            attributes,
        }
    }

    /// Attribute value by name, if present.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// String attribute by name; `None` for missing or non-string values.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// True when the named attribute is absent or an explicit JSON null.
    pub fn attr_is_null(&self, name: &str) -> bool {
        self.attributes.get(name).is_none_or(Value::is_null)
    }
}
