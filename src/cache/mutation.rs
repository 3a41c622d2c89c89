use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use tracing::debug;

use super::snapshot::OperationStatus;

#[derive(Default)]
struct MutationState {
    pending: usize,
    status: OperationStatus,
}

/// Status tracker for one kind of write (create, update or delete).
pub struct Mutation {
    name: &'static str,
    state: Mutex<MutationState>,
}

impl Mutation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(MutationState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> OperationStatus {
        self.state.lock().status.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending > 0
    }

    /// Drives `operation`, reporting loading while it runs and idle or error
    /// once it settles. Starting a run clears the previous error.
    pub async fn run<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        {
            let mut state = self.state.lock();
            state.pending += 1;
            state.status = OperationStatus::Loading;
        }

        let res = operation.await;

        let mut state = self.state.lock();
        state.pending -= 1;
        state.status = match &res {
            Err(err) => OperationStatus::Error(err.to_string()),
            Ok(_) if state.pending > 0 => OperationStatus::Loading,
            Ok(_) => OperationStatus::Idle,
        };
        debug!(mutation = self.name, status = %state.status, "mutation settled");
        res
    }
}
