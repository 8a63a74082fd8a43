// crates/list-sync/src/model.rs
//! The datastore model the list reads from

use async_trait::async_trait;
use restapis_core::{IndexPage, ListOptions, ModelResult};

/// Datastore model owning the REST APIs index
///
/// The list never writes records itself. Changes made through the model are
/// expected to come back as notifications (see [`crate::Notification`]).
#[async_trait]
pub trait IndexModel: Send + Sync {
    /// Lists one page of the index
    async fn list_index(&self, options: ListOptions) -> ModelResult<IndexPage>;

    /// Removes a record from the datastore
    async fn remove(&self, id: &str) -> ModelResult<()>;
}
