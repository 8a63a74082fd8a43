//! Index records of REST API projects

use crate::types::common::{collate, Validator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An entry of the REST APIs index
///
/// Field names follow the datastore document layout so records exported from
/// the datastore deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Datastore id, stable across updates
    #[serde(rename = "_id")]
    pub id: String,
    /// API title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// API description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sort precedence, lower first
    #[serde(default)]
    pub order: i64,
    /// Current version tag
    #[serde(rename = "latest", default)]
    pub latest_version: String,
    /// All known version tags
    #[serde(default)]
    pub versions: Vec<String>,
}

impl IndexRecord {
    /// Creates a record with only an id and an order
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            order,
            latest_version: String::new(),
            versions: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the latest version and records it in `versions`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        if !self.versions.contains(&version) {
            self.versions.push(version.clone());
        }
        self.latest_version = version;
        self
    }

    /// Display ordering: `order` ascending, then title.
    ///
    /// A record without a title sorts before one with a title.
    pub fn cmp_display(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| match (&self.title, &other.title) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => collate(a, b),
            })
    }
}

impl Validator for IndexRecord {
    fn validate(&self) -> Result<(), Vec<String>> {
        if self.id.is_empty() {
            Err(vec!["id must not be empty".to_string()])
        } else {
            Ok(())
        }
    }
}

/// Sorts records in display order. The sort is stable.
pub fn sort_records(records: &mut [IndexRecord]) {
    records.sort_by(IndexRecord::cmp_display);
}
