// crates/list-sync/tests/common/mod.rs
//! Shared helpers for list-sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use restapis_core::{IndexPage, IndexRecord, ListOptions, ModelError, ModelResult};
use restapis_list_sync::{EngineConfig, IndexModel, ListSyncEngine};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model answering page requests from a script
///
/// Once the script runs out every request gets an empty, final page.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResult<IndexPage>>>,
    requests: Mutex<Vec<ListOptions>>,
    removed: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn page(self, items: Vec<IndexRecord>, token: Option<&str>) -> Self {
        self.respond(Ok(IndexPage::new(items, token.map(str::to_string))))
    }

    pub fn failure(self, message: &str) -> Self {
        self.respond(Err(ModelError::query(message)))
    }

    fn respond(self, response: ModelResult<IndexPage>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ListOptions> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexModel for ScriptedModel {
    async fn list_index(&self, options: ListOptions) -> ModelResult<IndexPage> {
        self.requests.lock().unwrap().push(options);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(IndexPage::default()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn remove(&self, id: &str) -> ModelResult<()> {
        self.removed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

pub fn record(id: &str, order: i64, title: &str) -> IndexRecord {
    IndexRecord::new(id, order).with_title(title).with_version("v1")
}

pub fn config() -> EngineConfig {
    EngineConfig {
        store_name: "api-index".to_string(),
        debounce: Duration::from_millis(20),
        request_timeout: None,
        auto_query: true,
    }
}

pub fn engine(model: &Arc<ScriptedModel>) -> ListSyncEngine {
    ListSyncEngine::new(model.clone(), config())
}

pub fn ids(engine: &ListSyncEngine) -> Vec<String> {
    engine
        .state()
        .unwrap()
        .items()
        .unwrap_or_default()
        .iter()
        .map(|r| r.id.clone())
        .collect()
}

/// Lets spawned listeners drain their channels
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
