// crates/list-sync/src/signals.rs
//! Messages exchanged between the list and the hosting application
//!
//! Inbound notifications describe changes committed (or about to be
//! committed) by the datastore. Outbound signals are user intents the list
//! cannot fulfil itself.

use restapis_config::ALL_STORES;
use restapis_core::IndexRecord;
use serde::{Deserialize, Serialize};

/// Datastores named by a wipe notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatastoreScope {
    One(String),
    Many(Vec<String>),
}

impl DatastoreScope {
    pub fn names(&self) -> &[String] {
        match self {
            DatastoreScope::One(name) => std::slice::from_ref(name),
            DatastoreScope::Many(names) => names,
        }
    }

    /// Returns true if the scope names no datastore at all
    pub fn is_empty(&self) -> bool {
        self.names().iter().all(|name| name.is_empty())
    }

    /// Returns true if the wipe covers `store_name`
    pub fn affects(&self, store_name: &str) -> bool {
        self.names()
            .iter()
            .any(|name| name == store_name || name == ALL_STORES)
    }
}

impl From<&str> for DatastoreScope {
    fn from(name: &str) -> Self {
        DatastoreScope::One(name.to_string())
    }
}

impl From<Vec<String>> for DatastoreScope {
    fn from(names: Vec<String>) -> Self {
        DatastoreScope::Many(names)
    }
}

/// Change reported by the datastore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum IndexSignal {
    /// A bulk import finished
    DataImported,
    /// One or more datastores were destroyed
    DatastoreDestroyed { datastore: DatastoreScope },
    /// A record was created or updated
    #[serde(rename = "index-record-changed")]
    RecordChanged { record: IndexRecord },
    /// A record was deleted
    #[serde(rename = "index-record-deleted")]
    RecordDeleted { id: String },
}

/// An inbound signal with its cancelable flag
///
/// Cancelable notifications announce a change that has not been committed
/// yet and never alter the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub signal: IndexSignal,
    #[serde(default)]
    pub cancelable: bool,
}

impl Notification {
    /// A committed change
    pub fn committed(signal: IndexSignal) -> Self {
        Self {
            signal,
            cancelable: false,
        }
    }

    /// An advisory, not yet committed change
    pub fn advisory(signal: IndexSignal) -> Self {
        Self {
            signal,
            cancelable: true,
        }
    }
}

/// Where the user asked to go
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "base", rename_all = "kebab-case")]
pub enum NavigateTarget {
    /// Open an API project in the console
    ApiConsole { id: String, version: String },
    /// Open the external API catalog
    ExchangeSearch,
}

/// User intent published by the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundSignal {
    Navigate { target: NavigateTarget },
    /// Sent before the datastore is asked to remove the record
    RecordDeleteRequested { id: String },
}
