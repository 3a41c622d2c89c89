use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::snapshot::{sanitize, OperationStatus, TasksView};
use crate::model::Task;
use crate::store::{TaskStore, TransportError};

/// The only cache key: there is one collection and no parametrised query.
pub const TASKS_KEY: &str = "todos";

struct QueryState {
    tasks: Arc<Vec<Task>>,
    /// Sequence number handed to the most recently started fetch.
    issued: u64,
    /// Sequence number of the fetch whose answer is currently published.
    published: u64,
    in_flight: usize,
    stale: bool,
    status: OperationStatus,
}

impl QueryState {
    fn view(&self) -> TasksView {
        TasksView {
            tasks: self.tasks.clone(),
            is_loading: self.in_flight > 0,
            is_stale: self.stale,
            status: self.status.clone(),
            version: self.published,
        }
    }
}

/// Cached snapshot of the task collection, refreshed by invalidate-and-refetch.
///
/// Every fetch is tagged with an increasing sequence number. An answer is
/// published only if it belongs to a fetch started after the one currently
/// shown, so a slow answer to an older fetch never overwrites a newer one.
/// Overlapping fetches are not coalesced: each one reaches the store.
pub struct TaskQuery<S: TaskStore> {
    store: S,
    state: Mutex<QueryState>,
    tx: watch::Sender<TasksView>,
}

impl<S: TaskStore> TaskQuery<S> {
    pub fn new(store: S) -> Self {
        let (tx, _) = watch::channel(TasksView::default());
        Self {
            store,
            state: Mutex::new(QueryState {
                tasks: Arc::new(Vec::new()),
                issued: 0,
                published: 0,
                in_flight: 0,
                stale: false,
                status: OperationStatus::Idle,
            }),
            tx,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current snapshot and loading state; empty until the first load succeeds.
    pub fn view(&self) -> TasksView {
        self.state.lock().view()
    }

    /// Receiver woken every time the view changes.
    pub fn subscribe(&self) -> watch::Receiver<TasksView> {
        self.tx.subscribe()
    }

    fn publish(&self, state: &QueryState) {
        self.tx.send_replace(state.view());
    }

    /// Marks the snapshot stale. The tasks stay visible until a refetch replaces them.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.stale = true;
        self.publish(&state);
    }

    /// Reads the whole collection and publishes it as the new snapshot.
    #[instrument(skip(self), fields(key = TASKS_KEY))]
    pub async fn fetch(&self) -> Result<(), TransportError> {
        let seq = {
            let mut state = self.state.lock();
            state.issued += 1;
            state.in_flight += 1;
            state.status = OperationStatus::Loading;
            self.publish(&state);
            state.issued
        };

        let res = self.store.list_tasks().await;

        let mut state = self.state.lock();
        state.in_flight -= 1;
        let outcome = match res {
            Ok(tasks) if seq > state.published => {
                state.tasks = Arc::new(sanitize(tasks));
                state.published = seq;
                state.stale = false;
                info!(seq, tasks = state.tasks.len(), "snapshot published");
                Ok(())
            }
            Ok(_) => {
                debug!(seq, published = state.published, "discarding answer of an older fetch");
                Ok(())
            }
            Err(err) => {
                warn!(seq, reason = %err, "fetch failed, keeping previous snapshot");
                Err(err)
            }
        };

        state.status = match &outcome {
            _ if state.in_flight > 0 => OperationStatus::Loading,
            Err(err) if seq > state.published => OperationStatus::Error(err.to_string()),
            _ => OperationStatus::Idle,
        };
        self.publish(&state);
        outcome
    }

    /// Runs a write against the store. On success the snapshot is invalidated
    /// and refetched before returning; on failure nothing is touched.
    ///
    /// A refetch failure after a successful write still returns the written
    /// value: the write went through, so the failure stays on the query
    /// (stale snapshot, error status) for the next fetch to clear.
    pub async fn mutate<T, F>(&self, write: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let value = write.await?;
        self.invalidate();
        if let Err(err) = self.fetch().await {
            warn!(reason = %err, "write applied but refetch failed");
        }
        Ok(value)
    }
}
