pub mod error;
pub mod types;

pub use error::{Result, WriteError};
pub use types::{ACTION_ORDER, Action, Attributes, Identity};
