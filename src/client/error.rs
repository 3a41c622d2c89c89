use thiserror::Error;

use crate::model::ValidationError;
use crate::store::TransportError;

/// Everything a task sync operation can fail with.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SyncError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}
