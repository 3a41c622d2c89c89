mod mutation;
mod query;
mod snapshot;

pub use mutation::Mutation;
pub use query::{TaskQuery, TASKS_KEY};
pub use snapshot::{OperationStatus, TasksView};
