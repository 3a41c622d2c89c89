//! Task list kept in sync with a remote REST collection.
//!
//! [`store`] talks to the collection, [`cache`] holds the last snapshot and
//! refetches it after every write, [`client`] is what a presenter calls.

pub mod cache;
pub mod client;
pub mod config;
pub mod console;
pub mod log;
pub mod model;
pub mod store;

pub use client::{CompletionSummary, SyncError, TaskSyncClient};
pub use model::{Task, TaskId};

#[cfg(all(test, feature = "e2e"))]
mod e2e_tests;
