use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::model::Task;

/// Lifecycle of one fetch or mutation. An error only lives until the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Idle => f.write_str("idle"),
            OperationStatus::Loading => f.write_str("loading"),
            OperationStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// What the presentation layer reads: the last published snapshot plus the
/// state of the query that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TasksView {
    pub tasks: Arc<Vec<Task>>,
    pub is_loading: bool,
    /// Set between an invalidation and the refetch that replaces the snapshot.
    pub is_stale: bool,
    pub status: OperationStatus,
    /// Sequence number of the fetch that produced `tasks`, 0 before the first load.
    pub version: u64,
}

impl TasksView {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Turns a list answer into a snapshot: timestamps put in order and ids made
/// unique, keeping the first record seen for an id.
pub(crate) fn sanitize(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let mut out = Vec::with_capacity(tasks.len());
    for mut task in tasks {
        if !seen.insert(task.id.clone()) {
            warn!(id = %task.id, "dropping duplicate task id from store answer");
            continue;
        }
        if task.normalize() {
            warn!(id = %task.id, "task updated before it was created, clamping updatedAt");
        }
        out.push(task);
    }
    out
}
