use tokio::sync::watch;
use tracing::{info, instrument};

use super::{CompletionSummary, SyncError};
use crate::cache::{Mutation, OperationStatus, TaskQuery, TasksView};
use crate::model::{Task, TaskId, Title};
use crate::store::TaskStore;

/// Single entry point for the presentation layer: a read-model over the
/// remote collection plus the three writes, each followed by a refetch.
///
/// Draft input and the task being edited belong to the caller and are passed
/// in as plain parameters.
pub struct TaskSyncClient<S: TaskStore> {
    query: TaskQuery<S>,
    create: Mutation,
    update: Mutation,
    delete: Mutation,
}

impl<S: TaskStore> TaskSyncClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            query: TaskQuery::new(store),
            create: Mutation::new("create"),
            update: Mutation::new("update"),
            delete: Mutation::new("delete"),
        }
    }

    pub fn query(&self) -> &TaskQuery<S> {
        &self.query
    }

    /// First load, or a manual refresh.
    pub async fn load(&self) -> Result<(), SyncError> {
        Ok(self.query.fetch().await?)
    }

    pub fn get_tasks(&self) -> TasksView {
        self.query.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<TasksView> {
        self.query.subscribe()
    }

    /// Creates a task from `draft`. The draft is cleared once the store has
    /// accepted the task, even if the refetch after it fails; a rejected or
    /// failed create leaves it as typed.
    #[instrument(skip(self, draft))]
    pub async fn submit_new_task(&self, draft: &mut String) -> Result<Task, SyncError> {
        let title = Title::parse(draft)?;
        let store = self.query.store();
        let created = self
            .create
            .run(self.query.mutate(store.create_task(title)))
            .await?;
        info!(id = %created.id, "task created");
        draft.clear();
        Ok(created)
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    pub async fn toggle_completion(&self, task: &Task) -> Result<Task, SyncError> {
        self.replace(task.toggled()).await
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    pub async fn rename_task(&self, task: &Task, new_title: &str) -> Result<Task, SyncError> {
        let title = Title::parse(new_title)?;
        self.replace(task.renamed(title)).await
    }

    async fn replace(&self, task: Task) -> Result<Task, SyncError> {
        let store = self.query.store();
        let updated = self
            .update
            .run(self.query.mutate(store.update_task(task)))
            .await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn remove_task(&self, id: &TaskId) -> Result<(), SyncError> {
        let store = self.query.store();
        self.delete
            .run(self.query.mutate(store.delete_task(id)))
            .await?;
        info!("task removed");
        Ok(())
    }

    pub fn completion_summary(&self) -> CompletionSummary {
        CompletionSummary::of(&self.query.view().tasks)
    }

    pub fn create_status(&self) -> OperationStatus {
        self.create.status()
    }

    pub fn update_status(&self) -> OperationStatus {
        self.update.status()
    }

    pub fn delete_status(&self) -> OperationStatus {
        self.delete.status()
    }

    /// True while a create is in flight; the form refuses another submit meanwhile.
    pub fn is_creating(&self) -> bool {
        self.create.is_pending()
    }

    pub fn is_updating(&self) -> bool {
        self.update.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.delete.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::Method::{GET, POST, PUT};
    use httpmock::MockServer;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::model::ValidationError;
    use crate::store::{HttpTaskStore, MemoryTaskStore, StoreCalls, TransportError};

    async fn loaded_client(store: Arc<MemoryTaskStore>) -> TaskSyncClient<Arc<MemoryTaskStore>> {
        let client = TaskSyncClient::new(store);
        client.load().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_short_title_never_reaches_store() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        let mut draft = "ab".to_string();

        // WHEN
        let err = client.submit_new_task(&mut draft).await.unwrap_err();

        // THEN
        assert!(matches!(
            err,
            SyncError::Validation(ValidationError::TitleTooShort { len: 2, .. })
        ));
        assert_eq!(draft, "ab");
        assert!(client.get_tasks().is_empty());
        assert_eq!(
            store.calls(),
            StoreCalls {
                list: 1,
                ..StoreCalls::default()
            }
        );
        assert_eq!(client.create_status(), OperationStatus::Idle);
    }

    #[tokio::test]
    async fn test_create_only_for_valid_lengths() {
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;

        let mut expected_creates = 0;
        for len in 0..=30 {
            let mut draft = "x".repeat(len);
            let res = client.submit_new_task(&mut draft).await;
            if (3..=25).contains(&len) {
                expected_creates += 1;
                assert!(res.is_ok(), "length {} rejected", len);
                assert!(draft.is_empty());
            } else {
                assert!(res.unwrap_err().is_validation(), "length {} accepted", len);
            }
            assert_eq!(store.calls().create, expected_creates);
        }
        assert_eq!(client.get_tasks().tasks.len(), 23);
    }

    #[tokio::test]
    async fn test_submit_then_summary() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        let mut draft = "Buy milk".to_string();

        // WHEN
        client.submit_new_task(&mut draft).await.unwrap();

        // THEN
        assert!(draft.is_empty());
        let view = client.get_tasks();
        assert_eq!(view.tasks.len(), 1);
        assert_eq!(view.tasks[0].title, "Buy milk");
        assert!(!view.tasks[0].is_completed);
        assert_eq!(
            client.completion_summary(),
            CompletionSummary {
                completed: 0,
                total: 1,
                percentage: 0
            }
        );
        assert_eq!(*view.tasks, store.list_tasks().await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_advances_updated_at() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        client
            .submit_new_task(&mut "Buy milk".to_string())
            .await
            .unwrap();
        let before = client.get_tasks().tasks[0].clone();

        // WHEN
        client.toggle_completion(&before).await.unwrap();

        // THEN
        let after = client.get_tasks().tasks[0].clone();
        assert!(after.is_completed);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(
            client.completion_summary(),
            CompletionSummary {
                completed: 1,
                total: 1,
                percentage: 100
            }
        );

        // toggling again restores the flag
        client.toggle_completion(&after).await.unwrap();
        let again = client.get_tasks().tasks[0].clone();
        assert!(!again.is_completed);
        assert!(again.updated_at > after.updated_at);
    }

    #[tokio::test]
    async fn test_rename_rejects_short_title_without_put() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        client
            .submit_new_task(&mut "Buy milk".to_string())
            .await
            .unwrap();
        let task = client.get_tasks().tasks[0].clone();
        let before = client.get_tasks();

        // WHEN
        let err = client.rename_task(&task, "AB").await.unwrap_err();

        // THEN
        assert!(err.is_validation());
        assert_eq!(store.calls().update, 0);
        assert_eq!(client.get_tasks(), before);

        // WHEN
        client.rename_task(&task, "Buy oat milk").await.unwrap();

        // THEN
        assert_eq!(client.get_tasks().tasks[0].title, "Buy oat milk");
    }

    #[tokio::test]
    async fn test_failed_remove_can_be_retried() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        let task = client
            .submit_new_task(&mut "Buy milk".to_string())
            .await
            .unwrap();
        let before = client.get_tasks();

        // WHEN
        store.fail_next(1);
        let err = client.remove_task(&task.id).await.unwrap_err();

        // THEN
        assert!(matches!(
            err,
            SyncError::Transport(TransportError::Unavailable(_))
        ));
        assert_eq!(client.get_tasks(), before);
        assert!(matches!(client.delete_status(), OperationStatus::Error(_)));

        // WHEN
        client.remove_task(&task.id).await.unwrap();

        // THEN
        assert!(client.get_tasks().is_empty());
        assert_eq!(client.delete_status(), OperationStatus::Idle);
    }

    #[tokio::test]
    async fn test_accepted_create_clears_draft_when_refetch_fails() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;
        store.fail_lists(1);
        let mut draft = "Walk dog".to_string();

        // WHEN
        let created = client.submit_new_task(&mut draft).await.unwrap();

        // THEN
        assert_eq!(created.title, "Walk dog");
        assert!(draft.is_empty());
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(client.create_status(), OperationStatus::Idle);
        let view = client.get_tasks();
        assert!(view.is_empty());
        assert!(view.is_stale);
        assert!(matches!(view.status, OperationStatus::Error(_)));

        // WHEN
        client.load().await.unwrap();

        // THEN
        assert_eq!(*client.get_tasks().tasks, store.tasks());
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_writes_settle_on_store_state() {
        // GIVEN
        let store = Arc::new(MemoryTaskStore::new());
        let client = loaded_client(store.clone()).await;

        // WHEN
        let mut drafts: Vec<String> = ["Buy milk", "Walk dog", "Call mom", "Pay rent"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = futures::future::join_all(
            drafts.iter_mut().map(|draft| client.submit_new_task(draft)),
        )
        .await;

        // THEN
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(!client.is_creating());
        let view = client.get_tasks();
        assert_eq!(*view.tasks, store.list_tasks().await.unwrap());
        assert_eq!(view.tasks.len(), 4);
    }

    #[tokio::test]
    async fn test_http_submit_refetches_collection() {
        // GIVEN
        let server = MockServer::start_async().await;
        let created = json!({
            "id": 1,
            "title": "Buy milk",
            "isCompleted": false,
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-01T10:00:00.000Z",
        });
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/todos");
                then.status(201).json_body(created.clone());
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/todos");
                then.status(200).json_body(json!([created.clone()]));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(200).json_body(created.clone());
            })
            .await;
        let store = HttpTaskStore::new(Url::parse(&server.base_url()).unwrap(), None).unwrap();
        let client = TaskSyncClient::new(store);

        // WHEN
        client
            .submit_new_task(&mut "Buy milk".to_string())
            .await
            .unwrap();
        let task = client.get_tasks().tasks[0].clone();
        let _ = client.rename_task(&task, "AB").await;

        // THEN
        create.assert_hits_async(1).await;
        list.assert_hits_async(1).await;
        update.assert_hits_async(0).await;
        assert_eq!(client.completion_summary().total, 1);
    }

    #[tokio::test]
    async fn test_http_failure_surfaces_transport_error() {
        // GIVEN
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/todos");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/todos");
                then.status(500).body("boom");
            })
            .await;
        let store = HttpTaskStore::new(Url::parse(&server.base_url()).unwrap(), None).unwrap();
        let client = TaskSyncClient::new(store);
        client.load().await.unwrap();
        let mut draft = "Buy milk".to_string();

        // WHEN
        let err = client.submit_new_task(&mut draft).await.unwrap_err();

        // THEN
        assert!(matches!(
            err,
            SyncError::Transport(TransportError::Status { status: 500, .. })
        ));
        assert_eq!(draft, "Buy milk");
        list.assert_hits_async(1).await;
        assert!(matches!(client.create_status(), OperationStatus::Error(_)));
    }
}
