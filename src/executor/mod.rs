pub mod context;
pub mod dispatch;
pub mod relationship;
pub mod write;

pub use context::{RequestContext, TempIdMap};
pub use relationship::ActionGroups;
pub use write::WriteExecutor;
