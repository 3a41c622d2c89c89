use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use super::{TaskStore, TransportError};
use crate::model::{NewTask, Task, TaskId, Title};

/// Number of calls each operation received, failed ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    failures: usize,
    list_failures: usize,
    list_delays: VecDeque<Duration>,
    calls: StoreCalls,
}

/// In-process task collection keeping insertion order and numbering ids the
/// way json-server does. Failures and slow list responses can be scripted.
pub struct MemoryTaskStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| match t.id {
                TaskId::Number(n) => Some(n + 1),
                TaskId::Text(_) => None,
            })
            .max()
            .unwrap_or(1);
        Self {
            inner: Mutex::new(Inner {
                tasks,
                next_id,
                ..Inner::default()
            }),
        }
    }

    /// The next `count` calls, whatever the operation, fail as unavailable.
    pub fn fail_next(&self, count: usize) {
        self.inner.lock().failures = count;
    }

    /// The next `count` list calls fail as unavailable; writes are unaffected.
    pub fn fail_lists(&self, count: usize) {
        self.inner.lock().list_failures = count;
    }

    /// Delays the answer of upcoming list calls, one entry per call. The
    /// collection is read before sleeping, so a delayed answer can be stale.
    pub fn delay_lists(&self, delays: impl IntoIterator<Item = Duration>) {
        self.inner.lock().list_delays.extend(delays);
    }

    pub fn calls(&self) -> StoreCalls {
        self.inner.lock().calls
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    fn take_failure(inner: &mut Inner) -> Result<(), TransportError> {
        if inner.failures > 0 {
            inner.failures -= 1;
            return Err(TransportError::Unavailable(
                "scripted memory store failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        let (tasks, delay) = {
            let mut inner = self.inner.lock();
            inner.calls.list += 1;
            Self::take_failure(&mut inner)?;
            if inner.list_failures > 0 {
                inner.list_failures -= 1;
                return Err(TransportError::Unavailable(
                    "scripted memory store list failure".to_string(),
                ));
            }
            (inner.tasks.clone(), inner.list_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(tasks)
    }

    async fn create_task(&self, title: Title) -> Result<Task, TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.create += 1;
        Self::take_failure(&mut inner)?;

        let id = TaskId::Number(inner.next_id);
        inner.next_id += 1;
        let task = NewTask::new(title).with_id(id);
        inner.tasks.push(task.clone());
        debug!(id = %task.id, "memory store created task");
        Ok(task)
    }

    async fn update_task(&self, mut task: Task) -> Result<Task, TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.update += 1;
        Self::take_failure(&mut inner)?;

        task.touch();
        match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task)
            }
            None => Err(TransportError::not_found(&task.id)),
        }
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.delete += 1;
        Self::take_failure(&mut inner)?;

        match inner.tasks.iter().position(|t| &t.id == id) {
            Some(index) => {
                inner.tasks.remove(index);
                Ok(())
            }
            None => Err(TransportError::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(s: &str) -> Title {
        Title::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        // GIVEN
        let storage = MemoryTaskStore::new();

        // WHEN
        let a = storage.create_task(title("Buy milk")).await.unwrap();
        let b = storage.create_task(title("Walk dog")).await.unwrap();

        // THEN
        assert_eq!(a.id, TaskId::Number(1));
        assert_eq!(b.id, TaskId::Number(2));
        assert!(!a.is_completed);
        let items = storage.list_tasks().await.unwrap();
        assert_eq!(items, vec![a, b], "Items do not keep insertion order.");
    }

    #[tokio::test]
    async fn test_seeded_store_continues_numbering() {
        let seed = MemoryTaskStore::new();
        let first = seed.create_task(title("Buy milk")).await.unwrap();

        let storage = MemoryTaskStore::with_tasks(vec![first]);
        let next = storage.create_task(title("Walk dog")).await.unwrap();

        assert_eq!(next.id, TaskId::Number(2));
    }

    #[tokio::test]
    async fn test_update_replaces_record_and_stamps_time() {
        let storage = MemoryTaskStore::new();
        let task = storage.create_task(title("Buy milk")).await.unwrap();

        let updated = storage.update_task(task.toggled()).await.unwrap();

        assert!(updated.is_completed);
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(storage.tasks(), vec![updated]);
    }

    #[tokio::test]
    async fn test_missing_ids_answer_not_found() {
        let storage = MemoryTaskStore::new();
        let task = storage.create_task(title("Buy milk")).await.unwrap();
        storage.delete_task(&task.id).await.unwrap();

        let res = storage.delete_task(&task.id).await.unwrap_err();
        assert!(matches!(res, TransportError::Status { status: 404, .. }));

        let res = storage.update_task(task).await.unwrap_err();
        assert!(matches!(res, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed() {
        let storage = MemoryTaskStore::new();
        storage.fail_next(1);

        let res = storage.create_task(title("Buy milk")).await;
        assert!(matches!(res, Err(TransportError::Unavailable(_))));
        assert!(storage.tasks().is_empty());

        storage.create_task(title("Buy milk")).await.unwrap();
        assert_eq!(
            storage.calls(),
            StoreCalls {
                create: 2,
                ..StoreCalls::default()
            }
        );
    }
}
