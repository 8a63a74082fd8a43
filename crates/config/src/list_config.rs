//! List synchronization configuration section

use crate::validation::{rules, ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scope name that addresses every datastore at once
pub const ALL_STORES: &str = "all";

const MAX_DEBOUNCE_MS: u64 = 5_000;
const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;

/// Settings of the REST APIs list engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListConfig {
    /// Name of the datastore mirrored by the list
    pub store_name: String,

    /// Delay used to coalesce query requests, in milliseconds
    pub debounce_ms: u64,

    /// Per-page request timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: u64,

    /// Query the datastore when the list is first displayed
    pub auto_query: bool,
}

impl ListConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Returns the request timeout, or `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            store_name: "api-index".to_string(),
            debounce_ms: 20,
            request_timeout_ms: 0,
            auto_query: true,
        }
    }
}

impl ConfigSection for ListConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        // "all" is the wildcard wipe scope, never a store of its own
        rules::report([
            rules::not_blank("list.store_name", &self.store_name),
            rules::not_reserved("list.store_name", &self.store_name, &[ALL_STORES]),
            rules::at_most("list.debounce_ms", self.debounce_ms, MAX_DEBOUNCE_MS),
            rules::at_most(
                "list.request_timeout_ms",
                self.request_timeout_ms,
                MAX_REQUEST_TIMEOUT_MS,
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.store_name = other.store_name;
        self.debounce_ms = other.debounce_ms;
        self.request_timeout_ms = other.request_timeout_ms;
        self.auto_query = other.auto_query;
    }

    fn section_name(&self) -> &'static str {
        "list"
    }
}
