// crates/list-sync/src/engine.rs
//! List synchronization engine

use crate::error::{SyncError, SyncResult};
use crate::model::IndexModel;
use crate::signals::{DatastoreScope, IndexSignal, NavigateTarget, Notification, OutboundSignal};
use crate::state::ListState;
use restapis_config::ListConfig;
use restapis_core::{IndexPage, IndexRecord, ListOptions, ModelError, ModelResult};
use restapis_resilience::{Debouncer, Timeout};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

const OUTBOUND_CAPACITY: usize = 64;

/// Configuration for the list engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Datastore mirrored by the list; wipes of other stores are ignored
    pub store_name: String,
    /// Delay used to coalesce query requests
    pub debounce: Duration,
    /// Per-page request timeout
    pub request_timeout: Option<Duration>,
    /// Query on first display
    pub auto_query: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&ListConfig::default())
    }
}

impl From<&ListConfig> for EngineConfig {
    fn from(config: &ListConfig) -> Self {
        Self {
            store_name: config.store_name.clone(),
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
            auto_query: config.auto_query,
        }
    }
}

/// Result of a single page request
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Records were merged; `has_more` is true when another page follows
    Merged { count: usize, has_more: bool },
    /// The page was empty
    Empty,
    /// The model failed; the list is unchanged
    Failed(ModelError),
    /// The list was reset or disposed while the request was in flight
    Discarded,
}

impl PageOutcome {
    fn continues(&self) -> bool {
        matches!(self, PageOutcome::Merged { has_more: true, .. })
    }
}

struct EngineInner {
    model: Arc<dyn IndexModel>,
    config: EngineConfig,
    state: Mutex<ListState>,
    query: Mutex<Option<String>>,
    debouncer: Debouncer,
    // Bumped by every reset; page responses from an older generation are dropped.
    generation: AtomicU64,
    disposed: AtomicBool,
    outbound: broadcast::Sender<OutboundSignal>,
    revision: watch::Sender<u64>,
}

/// Keeps an in-memory list in sync with a paginated datastore index
///
/// Cloning is cheap; clones share the same list.
#[derive(Clone)]
pub struct ListSyncEngine {
    inner: Arc<EngineInner>,
}

impl ListSyncEngine {
    /// Creates a new engine over `model`
    pub fn new(model: Arc<dyn IndexModel>, config: EngineConfig) -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        let (revision, _) = watch::channel(0);
        let debouncer = Debouncer::new(config.debounce);

        Self {
            inner: Arc::new(EngineInner {
                model,
                config,
                state: Mutex::new(ListState::new()),
                query: Mutex::new(None),
                debouncer,
                generation: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                outbound,
                revision,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Gets a copy of the current list state
    pub fn state(&self) -> SyncResult<ListState> {
        self.lock_state().map(|state| state.clone())
    }

    /// Subscribes to user intents published by the list
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundSignal> {
        self.inner.outbound.subscribe()
    }

    /// Watches the list revision, bumped after every visible change
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// True while a query is scheduled or pages are being loaded
    pub fn is_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Waits until no query is scheduled or running
    pub async fn until_idle(&self) {
        self.inner.debouncer.idle().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    // ----- pagination -----

    /// Issues the initial query when the list is first displayed
    ///
    /// Does nothing if auto query is disabled, a query is running, or the list
    /// was already loaded.
    pub fn first_display(&self) -> SyncResult<bool> {
        if !self.inner.config.auto_query {
            return Ok(false);
        }
        let idle_and_absent = {
            let state = self.lock_state()?;
            !state.is_querying() && state.items().is_none()
        };
        if idle_and_absent {
            self.request_query()
        } else {
            Ok(false)
        }
    }

    /// Requests the next page
    ///
    /// The fetch starts after the debounce delay and keeps loading pages until
    /// the index is exhausted. Calls made while a fetch cycle is scheduled or
    /// running are no-ops. Returns true if a new cycle was scheduled.
    pub fn request_query(&self) -> SyncResult<bool> {
        if self.is_disposed() {
            return Ok(false);
        }

        let engine = self.clone();
        let scheduled = self
            .inner
            .debouncer
            .schedule(async move { engine.run_pagination().await })?;
        if !scheduled {
            log::trace!("Query already pending for {}", self.inner.config.store_name);
        }
        Ok(scheduled)
    }

    async fn run_pagination(&self) {
        loop {
            match self.load_page().await {
                Ok(outcome) if outcome.continues() => {
                    tokio::time::sleep(self.inner.config.debounce).await;
                }
                Ok(_) => break,
                Err(e) => {
                    log::error!("Pagination of {} stopped: {}", self.inner.config.store_name, e);
                    break;
                }
            }
        }
    }

    /// Loads one page and merges it into the list
    ///
    /// Model failures are not errors here: the busy flag is cleared, the list
    /// stays as it was and the outcome reports the failure.
    pub async fn load_page(&self) -> SyncResult<PageOutcome> {
        if self.is_disposed() {
            return Ok(PageOutcome::Discarded);
        }

        let generation = self.inner.generation.load(Ordering::SeqCst);
        let options = {
            let mut state = self.lock_state()?;
            state.begin_query();
            ListOptions::from_token(state.cursor())
        };
        self.bump_revision();
        log::debug!(
            "Querying {} (cursor: {:?})",
            self.inner.config.store_name,
            options.next_page_token
        );

        let result = self.fetch(options).await;

        let mut state = self.lock_state()?;
        if self.is_disposed() || self.inner.generation.load(Ordering::SeqCst) != generation {
            log::debug!("Dropping stale page of {}", self.inner.config.store_name);
            return Ok(PageOutcome::Discarded);
        }

        let outcome = match result {
            Err(e) => {
                log::warn!("Index query failed, list left unchanged: {}", e);
                state.finish_query();
                PageOutcome::Failed(e)
            }
            Ok(IndexPage {
                items,
                next_page_token,
            }) => {
                let has_more = next_page_token.is_some();
                state.set_cursor(next_page_token);
                state.finish_query();
                if items.is_empty() {
                    PageOutcome::Empty
                } else {
                    let count = items.len();
                    state.merge_page(items);
                    log::debug!("Merged {} records, list has {}", count, state.len());
                    PageOutcome::Merged { count, has_more }
                }
            }
        };
        drop(state);

        self.bump_revision();
        Ok(outcome)
    }

    async fn fetch(&self, options: ListOptions) -> ModelResult<IndexPage> {
        let request = self.inner.model.list_index(options);
        match self.inner.config.request_timeout {
            None => request.await,
            Some(limit) => Timeout::new(limit)
                .execute(request)
                .await
                .unwrap_or_else(|_| Err(timed_out(limit))),
        }
    }

    /// Clears the cursor and busy flag and empties the list
    ///
    /// A scheduled or running query is cancelled.
    pub fn reset(&self) -> SyncResult<()> {
        self.inner.debouncer.cancel();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.lock_state()?.reset();
        self.bump_revision();
        Ok(())
    }

    /// Resets the list and queries the datastore again
    pub fn refresh(&self) -> SyncResult<bool> {
        log::info!("Refreshing {}", self.inner.config.store_name);
        self.reset()?;
        self.request_query()
    }

    // ----- reconciliation -----

    /// Applies a created or updated record
    ///
    /// Returns false if the notification was ignored.
    pub fn on_upsert(&self, record: IndexRecord, cancelable: bool) -> SyncResult<bool> {
        if !self.accepts(cancelable, "record change") {
            return Ok(false);
        }
        self.lock_state()?.upsert(record);
        self.bump_revision();
        Ok(true)
    }

    /// Applies a deleted record
    ///
    /// Returns true if a record was removed from any list.
    pub fn on_delete(&self, id: &str, cancelable: bool) -> SyncResult<bool> {
        if !self.accepts(cancelable, "record delete") {
            return Ok(false);
        }
        let removed = self.lock_state()?.delete(id);
        if removed {
            self.bump_revision();
        }
        Ok(removed)
    }

    /// Refreshes the list if the wipe covers its datastore
    ///
    /// Returns true if a refresh was triggered.
    pub fn on_wipe(&self, scope: &DatastoreScope, cancelable: bool) -> SyncResult<bool> {
        if !self.accepts(cancelable, "datastore wipe") {
            return Ok(false);
        }
        if scope.is_empty() || !scope.affects(&self.inner.config.store_name) {
            log::debug!("Ignoring wipe of {:?}", scope.names());
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Rebuilds the list after a bulk import
    pub fn on_imported(&self, cancelable: bool) -> SyncResult<bool> {
        if !self.accepts(cancelable, "data import") {
            return Ok(false);
        }
        self.reset()?;
        self.refresh()?;
        Ok(true)
    }

    /// Dispatches a notification to the matching handler
    pub fn handle(&self, notification: Notification) -> SyncResult<bool> {
        let Notification { signal, cancelable } = notification;
        match signal {
            IndexSignal::DataImported => self.on_imported(cancelable),
            IndexSignal::DatastoreDestroyed { datastore } => self.on_wipe(&datastore, cancelable),
            IndexSignal::RecordChanged { record } => self.on_upsert(record, cancelable),
            IndexSignal::RecordDeleted { id } => self.on_delete(&id, cancelable),
        }
    }

    /// Applies notifications from `receiver` until it closes or the engine is disposed
    pub fn listen(&self, mut receiver: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                if engine.is_disposed() {
                    break;
                }
                if let Err(e) = engine.handle(notification) {
                    log::error!("Failed to apply notification: {}", e);
                }
            }
            log::debug!("Notification listener for {} stopped", engine.inner.config.store_name);
        })
    }

    fn accepts(&self, cancelable: bool, what: &str) -> bool {
        if self.is_disposed() {
            log::debug!("Ignoring {} after dispose", what);
            return false;
        }
        if cancelable {
            log::debug!("Ignoring cancelable {}", what);
            return false;
        }
        true
    }

    // ----- search -----

    /// Filters the list by `query`, or ends the search when it is empty
    ///
    /// Ending a search restores the list saved when it began. Without a saved
    /// list the datastore is queried again.
    pub fn query_items(&self, query: Option<&str>) -> SyncResult<()> {
        let needs_refresh = {
            let mut state = self.lock_state()?;
            match query.filter(|q| !q.is_empty()) {
                Some(query) => {
                    state.enter_search(query);
                    false
                }
                None => !state.exit_search(),
            }
        };
        self.bump_revision();

        if needs_refresh {
            self.refresh()?;
        }
        Ok(())
    }

    /// Stores the query typed by the user without searching
    pub fn set_query(&self, query: impl Into<String>) -> SyncResult<()> {
        *self.lock_query()? = Some(query.into());
        Ok(())
    }

    pub fn query(&self) -> SyncResult<Option<String>> {
        self.lock_query().map(|query| query.clone())
    }

    /// Runs the search for the stored query
    pub fn update_search(&self) -> SyncResult<()> {
        let query = self.query()?;
        self.query_items(query.as_deref())
    }

    // ----- user intents -----

    /// Asks the host to open the visible record at `index`
    pub fn open_record(&self, index: usize) -> SyncResult<()> {
        let target = {
            let state = self.lock_state()?;
            let record = state.item(index).ok_or(SyncError::IndexOutOfRange {
                index,
                len: state.len(),
            })?;
            NavigateTarget::ApiConsole {
                id: record.id.clone(),
                version: record.latest_version.clone(),
            }
        };
        self.publish(OutboundSignal::Navigate { target });
        Ok(())
    }

    /// Asks the host to open the external API catalog
    pub fn open_explore(&self) {
        self.publish(OutboundSignal::Navigate {
            target: NavigateTarget::ExchangeSearch,
        });
    }

    /// Asks the datastore to remove a record
    ///
    /// The list itself is not changed; it follows the delete notification the
    /// datastore sends once the removal is committed.
    pub async fn delete_item(&self, id: &str) -> SyncResult<()> {
        self.publish(OutboundSignal::RecordDeleteRequested { id: id.to_string() });
        self.inner.model.remove(id).await?;
        Ok(())
    }

    /// Removes the visible record at `index`
    pub async fn delete_item_at(&self, index: usize) -> SyncResult<()> {
        let id = {
            let state = self.lock_state()?;
            state
                .item(index)
                .map(|record| record.id.clone())
                .ok_or(SyncError::IndexOutOfRange {
                    index,
                    len: state.len(),
                })?
        };
        self.delete_item(&id).await
    }

    /// Stops the engine
    ///
    /// Cancels any scheduled or running query. Responses arriving later are
    /// dropped and further notifications are ignored.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.debouncer.cancel();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        log::debug!("Disposed list engine for {}", self.inner.config.store_name);
    }

    fn publish(&self, signal: OutboundSignal) {
        if self.inner.outbound.send(signal).is_err() {
            log::debug!("No subscribers for outbound signal");
        }
    }

    fn bump_revision(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn lock_state(&self) -> SyncResult<MutexGuard<'_, ListState>> {
        self.inner.state.lock().map_err(|_| SyncError::LockPoisoned)
    }

    fn lock_query(&self) -> SyncResult<MutexGuard<'_, Option<String>>> {
        self.inner.query.lock().map_err(|_| SyncError::LockPoisoned)
    }
}

fn timed_out(limit: Duration) -> ModelError {
    ModelError::Timeout {
        millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct StaticModel {
        page: IndexPage,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexModel for StaticModel {
        async fn list_index(&self, _options: ListOptions) -> ModelResult<IndexPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.page.clone())
        }

        async fn remove(&self, id: &str) -> ModelResult<()> {
            Err(ModelError::NotFound { id: id.to_string() })
        }
    }

    fn engine_with(items: Vec<IndexRecord>) -> (ListSyncEngine, Arc<StaticModel>) {
        let model = Arc::new(StaticModel {
            page: IndexPage::new(items, None),
            calls: AtomicUsize::new(0),
        });
        let engine = ListSyncEngine::new(model.clone(), EngineConfig::default());
        (engine, model)
    }

    #[test]
    fn test_engine_config_from_list_config() {
        let list = ListConfig {
            store_name: "legacy".to_string(),
            debounce_ms: 5,
            request_timeout_ms: 100,
            auto_query: false,
        };
        let config = EngineConfig::from(&list);
        assert_eq!(config.store_name, "legacy");
        assert_eq!(config.debounce, Duration::from_millis(5));
        assert_eq!(config.request_timeout, Some(Duration::from_millis(100)));
        assert!(!config.auto_query);
    }

    #[test]
    fn test_timeout_error_saturates() {
        assert_eq!(
            timed_out(Duration::from_millis(250)),
            ModelError::Timeout { millis: 250 }
        );
        assert_eq!(
            timed_out(Duration::MAX),
            ModelError::Timeout { millis: u64::MAX }
        );
    }

    #[test]
    fn test_engine_creation() {
        let (engine, _) = engine_with(vec![]);
        let state = engine.state().unwrap();
        assert!(state.items().is_none());
        assert!(!engine.is_pending());
        assert_eq!(engine.config().store_name, "api-index");
    }

    #[tokio::test]
    async fn test_load_page_merges() {
        let (engine, model) = engine_with(vec![IndexRecord::new("b", 1), IndexRecord::new("a", 0)]);

        let outcome = engine.load_page().await.unwrap();
        assert_eq!(
            outcome,
            PageOutcome::Merged {
                count: 2,
                has_more: false
            }
        );
        let state = engine.state().unwrap();
        assert_eq!(state.items().unwrap()[0].id, "a");
        assert!(!state.is_querying());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_page_empty() {
        let (engine, _) = engine_with(vec![]);
        assert_eq!(engine.load_page().await.unwrap(), PageOutcome::Empty);
        assert!(engine.state().unwrap().items().is_none());
    }

    #[test]
    fn test_cancelable_notifications_ignored() {
        let (engine, _) = engine_with(vec![]);
        assert!(!engine.on_upsert(IndexRecord::new("a", 0), true).unwrap());
        assert!(!engine.on_delete("a", true).unwrap());
        assert!(!engine.on_imported(true).unwrap());
        assert!(engine.state().unwrap().items().is_none());
    }

    #[test]
    fn test_revision_bumped_on_change() {
        let (engine, _) = engine_with(vec![]);
        let changes = engine.changes();
        let before = *changes.borrow();

        engine.on_upsert(IndexRecord::new("a", 0), false).unwrap();
        assert!(*changes.borrow() > before);
    }

    #[test]
    fn test_open_record_out_of_range() {
        let (engine, _) = engine_with(vec![]);
        let err = engine.open_record(3).unwrap_err();
        assert!(matches!(err, SyncError::IndexOutOfRange { index: 3, len: 0 }));
    }

    #[test]
    fn test_open_explore_publishes() {
        let (engine, _) = engine_with(vec![]);
        let mut signals = engine.subscribe();
        engine.open_explore();
        assert_eq!(
            signals.try_recv().unwrap(),
            OutboundSignal::Navigate {
                target: NavigateTarget::ExchangeSearch
            }
        );
    }

    #[tokio::test]
    async fn test_delete_failure_propagates() {
        let (engine, _) = engine_with(vec![]);
        let err = engine.delete_item("ghost").await.unwrap_err();
        assert!(matches!(err, SyncError::Model(ModelError::NotFound { .. })));
    }

    #[test]
    fn test_request_query_without_runtime() {
        let (engine, _) = engine_with(vec![]);
        assert!(matches!(
            engine.request_query(),
            Err(SyncError::Scheduling(_))
        ));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (engine, _) = engine_with(vec![]);
        engine.dispose();
        engine.dispose();
        assert!(engine.is_disposed());
        assert!(!engine.request_query().unwrap());
        assert!(!engine.on_upsert(IndexRecord::new("a", 0), false).unwrap());
    }
}
