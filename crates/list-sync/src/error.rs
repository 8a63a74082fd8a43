// crates/list-sync/src/error.rs
//! Error types for list synchronization

use restapis_core::ModelError;
use restapis_resilience::ResilienceError;
use thiserror::Error;

/// Result type for list synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while driving the list
#[derive(Debug, Error)]
pub enum SyncError {
    /// The datastore model rejected a request
    #[error("Datastore error: {0}")]
    Model(#[from] ModelError),

    /// A query could not be scheduled
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] ResilienceError),

    /// List state lock was poisoned by a panicking holder
    #[error("List state lock poisoned")]
    LockPoisoned,

    /// No visible item at the requested position
    #[error("No item at index {index} (list has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
}
