// crates/list-sync/src/memory.rs
//! In-memory index datastore
//!
//! Serves pages out of a vector and reports every committed change on a
//! notification channel, the way a real datastore would.

use crate::model::IndexModel;
use crate::signals::{DatastoreScope, IndexSignal, Notification};
use async_trait::async_trait;
use restapis_core::{IndexPage, IndexRecord, ListOptions, ModelError, ModelResult, Validator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Index datastore kept in memory
#[derive(Debug)]
pub struct MemoryIndexModel {
    store_name: String,
    records: Mutex<Vec<IndexRecord>>,
    page_size: usize,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
    list_calls: AtomicUsize,
}

impl MemoryIndexModel {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            records: Mutex::new(Vec::new()),
            page_size: DEFAULT_PAGE_SIZE,
            notifier: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the number of records served per page (at least one)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seeds the store without sending notifications
    pub fn with_records(self, records: impl IntoIterator<Item = IndexRecord>) -> Self {
        if let Ok(mut stored) = self.records.lock() {
            stored.extend(records);
        }
        self
    }

    /// Creates the channel committed changes are reported on
    pub fn notifications(&mut self) -> mpsc::UnboundedReceiver<Notification> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.notifier = Some(sender);
        receiver
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored record, in insertion order
    pub fn records(&self) -> ModelResult<Vec<IndexRecord>> {
        self.lock().map(|records| records.clone())
    }

    /// Number of page requests served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Creates or replaces a record
    pub fn put(&self, record: IndexRecord) -> ModelResult<()> {
        record
            .validate()
            .map_err(|errors| ModelError::InvalidRecord {
                reason: errors.join(", "),
            })?;

        {
            let mut records = self.lock()?;
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
        }
        self.notify(IndexSignal::RecordChanged { record });
        Ok(())
    }

    /// Adds records in bulk and reports a single import
    pub fn import(&self, imported: impl IntoIterator<Item = IndexRecord>) -> ModelResult<usize> {
        let count = {
            let mut records = self.lock()?;
            let mut count = 0;
            for record in imported {
                if !record.is_valid() {
                    log::warn!("Skipping invalid record during import");
                    continue;
                }
                records.retain(|r| r.id != record.id);
                records.push(record);
                count += 1;
            }
            count
        };
        log::info!("Imported {} records into {}", count, self.store_name);
        self.notify(IndexSignal::DataImported);
        Ok(count)
    }

    /// Drops every record if `scope` covers this store
    pub fn destroy(&self, scope: impl Into<DatastoreScope>) -> ModelResult<bool> {
        let scope = scope.into();
        if !scope.affects(&self.store_name) {
            return Ok(false);
        }
        self.lock()?.clear();
        self.notify(IndexSignal::DatastoreDestroyed { datastore: scope });
        Ok(true)
    }

    fn notify(&self, signal: IndexSignal) {
        if let Some(notifier) = &self.notifier {
            if notifier.send(Notification::committed(signal)).is_err() {
                log::debug!("Notification receiver for {} dropped", self.store_name);
            }
        }
    }

    fn lock(&self) -> ModelResult<MutexGuard<'_, Vec<IndexRecord>>> {
        self.records
            .lock()
            .map_err(|_| ModelError::Unavailable(format!("{} lock poisoned", self.store_name)))
    }
}

#[async_trait]
impl IndexModel for MemoryIndexModel {
    async fn list_index(&self, options: ListOptions) -> ModelResult<IndexPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let start = match options.next_page_token.as_deref() {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ModelError::query(format!("invalid page token: {}", token)))?,
        };

        let records = self.lock()?;
        let end = start.saturating_add(self.page_size).min(records.len());
        let items = records.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_page_token = (end < records.len()).then(|| end.to_string());

        Ok(IndexPage::new(items, next_page_token))
    }

    async fn remove(&self, id: &str) -> ModelResult<()> {
        {
            let mut records = self.lock()?;
            let position = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| ModelError::NotFound { id: id.to_string() })?;
            records.remove(position);
        }
        self.notify(IndexSignal::RecordDeleted { id: id.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize) -> MemoryIndexModel {
        MemoryIndexModel::new("api-index")
            .with_page_size(2)
            .with_records((0..count).map(|i| IndexRecord::new(format!("api-{}", i), i as i64)))
    }

    #[tokio::test]
    async fn test_pages_with_offset_tokens() {
        let model = seeded(5);

        let first = model.list_index(ListOptions::default()).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let last = model
            .list_index(ListOptions::from_token(Some("4")))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.next_page_token.is_none());
        assert_eq!(model.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_past_the_end_is_empty() {
        let model = seeded(2);
        let page = model
            .list_index(ListOptions::from_token(Some("10")))
            .await
            .unwrap();
        assert!(page.is_exhausted());
    }

    #[tokio::test]
    async fn test_huge_token_is_empty() {
        let model = seeded(2);
        let token = usize::MAX.to_string();
        let page = model
            .list_index(ListOptions::from_token(Some(token.as_str())))
            .await
            .unwrap();
        assert!(page.is_exhausted());
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let model = seeded(2);
        let err = model
            .list_index(ListOptions::from_token(Some("abc")))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::QueryFailed { .. }));
    }

    #[tokio::test]
    async fn test_put_notifies() {
        let mut model = MemoryIndexModel::new("api-index");
        let mut rx = model.notifications();

        model.put(IndexRecord::new("a", 0).with_title("A")).unwrap();
        model.put(IndexRecord::new("a", 0).with_title("A2")).unwrap();
        assert_eq!(model.len(), 1);

        let first = rx.recv().await.unwrap();
        assert!(!first.cancelable);
        assert!(matches!(first.signal, IndexSignal::RecordChanged { .. }));
    }

    #[test]
    fn test_put_rejects_invalid() {
        let model = MemoryIndexModel::new("api-index");
        let err = model.put(IndexRecord::new("", 0)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRecord { .. }));
        assert!(model.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let mut model = seeded(1);
        let mut rx = model.notifications();

        model.remove("api-0").await.unwrap();
        assert!(model.is_empty());
        assert_eq!(
            rx.recv().await.unwrap().signal,
            IndexSignal::RecordDeleted {
                id: "api-0".to_string()
            }
        );

        let err = model.remove("api-0").await.unwrap_err();
        assert_eq!(err, ModelError::NotFound { id: "api-0".to_string() });
    }

    #[test]
    fn test_destroy_scope() {
        let model = seeded(3);
        assert!(!model.destroy("other-store").unwrap());
        assert_eq!(model.len(), 3);
        assert!(model.destroy("all").unwrap());
        assert!(model.is_empty());
    }

    #[test]
    fn test_import_skips_invalid() {
        let model = seeded(1);
        let count = model
            .import(vec![IndexRecord::new("api-0", 9), IndexRecord::new("", 0)])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(model.records().unwrap()[0].order, 9);
    }
}
