mod error;
mod http;
mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::{Task, TaskId, Title};
pub use error::TransportError;
pub use http::HttpTaskStore;
pub use memory::{MemoryTaskStore, StoreCalls};

/// The remote task collection: list, create, replace and delete.
///
/// Implementations stamp timestamps themselves: `create_task` sets both to
/// now, `update_task` overwrites `updated_at` whatever the caller sent.
#[async_trait]
pub trait TaskStore: Sync + Send + 'static {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError>;
    async fn create_task(&self, title: Title) -> Result<Task, TransportError>;
    async fn update_task(&self, task: Task) -> Result<Task, TransportError>;
    async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError>;
}

#[async_trait]
impl<S: TaskStore> TaskStore for Arc<S> {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        (**self).list_tasks().await
    }

    async fn create_task(&self, title: Title) -> Result<Task, TransportError> {
        (**self).create_task(title).await
    }

    async fn update_task(&self, task: Task) -> Result<Task, TransportError> {
        (**self).update_task(task).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        (**self).delete_task(id).await
    }
}

#[async_trait]
impl TaskStore for Box<dyn TaskStore> {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        (**self).list_tasks().await
    }

    async fn create_task(&self, title: Title) -> Result<Task, TransportError> {
        (**self).create_task(title).await
    }

    async fn update_task(&self, task: Task) -> Result<Task, TransportError> {
        (**self).update_task(task).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        (**self).delete_task(id).await
    }
}
