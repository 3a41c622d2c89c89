mod error;
mod summary;
mod sync;

pub use error::SyncError;
pub use summary::CompletionSummary;
pub use sync::TaskSyncClient;
