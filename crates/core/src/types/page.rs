//! Payloads exchanged with the index datastore model

use crate::types::IndexRecord;
use serde::{Deserialize, Serialize};

/// Options passed to an index query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Continuation token of the previous page, omitted for the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListOptions {
    /// Builds query options from the current cursor
    pub fn from_token(token: Option<&str>) -> Self {
        Self {
            next_page_token: token.map(str::to_string),
        }
    }
}

/// One page of index records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    /// Records in this page, in datastore order
    #[serde(default)]
    pub items: Vec<IndexRecord>,
    /// Token for the next page; `None` when the index is exhausted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl IndexPage {
    /// Creates a page
    pub fn new(items: Vec<IndexRecord>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// Returns true if no further page can follow this one
    pub fn is_exhausted(&self) -> bool {
        self.items.is_empty() || self.next_page_token.is_none()
    }
}
