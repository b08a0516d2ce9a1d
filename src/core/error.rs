use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Validation failed for '{entity_type}': {}", .messages.join("; "))]
    Validation {
        entity_type: String,
        messages: Vec<String>,
    },

    #[error("{entity_type} record '{id}' not found")]
    NotFound { entity_type: String, id: String },

    #[error("Temp id '{0}' has no durable id; the entity it names was never persisted")]
    UnresolvedTempId(String),

    #[error("Temp id '{temp_id}' is already bound to durable id '{existing}'")]
    DuplicateTempId { temp_id: String, existing: String },

    #[error("Malformed write payload: {0}")]
    MalformedPayload(String),

    #[error("Storage error for '{entity_type}': {message}")]
    Backend {
        entity_type: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, WriteError>;

impl WriteError {
    /// Shorthand for a single-message validation failure.
    pub fn validation(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            entity_type: entity_type.into(),
            messages: vec![message.into()],
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
