// crates/list-sync/src/lib.rs
//! REST APIs list synchronization
//!
//! This module keeps an in-memory, sorted list of index records in step with
//! a paginated datastore:
//! - Debounced page loading until the index is exhausted
//! - Reconciliation of record change, delete, wipe and import notifications
//! - Client-side search over a snapshot of the loaded list
//! - Navigation and delete intents published to the host
//!
//! # Example
//!
//! ```rust
//! use restapis_core::IndexRecord;
//! use restapis_list_sync::{EngineConfig, ListSyncEngine, MemoryIndexModel};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let model = MemoryIndexModel::new("api-index")
//!     .with_records(vec![IndexRecord::new("api-1", 0).with_title("Petstore")]);
//!
//! let engine = ListSyncEngine::new(Arc::new(model), EngineConfig::default());
//! engine.request_query().unwrap();
//! engine.until_idle().await;
//!
//! assert_eq!(engine.state().unwrap().len(), 1);
//! # }
//! ```

mod engine;
mod error;
mod memory;
mod model;
mod search;
mod signals;
mod state;

pub use engine::{EngineConfig, ListSyncEngine, PageOutcome};
pub use error::{SyncError, SyncResult};
pub use memory::{MemoryIndexModel, DEFAULT_PAGE_SIZE};
pub use model::IndexModel;
pub use search::{filter_records, matches, prepare_query};
pub use signals::{DatastoreScope, IndexSignal, NavigateTarget, Notification, OutboundSignal};
pub use state::{ListState, Mode};
