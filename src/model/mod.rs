pub mod correlation_id;
pub mod error;
pub mod task;

pub use correlation_id::CorrelationId;
pub use error::ValidationError;
pub use task::{draft_problem, validate_title, NewTask, Task, TaskId, Title, TITLE_MAX_LEN, TITLE_MIN_LEN};
