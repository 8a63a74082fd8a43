// crates/list-sync/src/state.rs
//! In-memory list state
//!
//! `items` is what the user sees. While browsing it is the mirror of the
//! datastore index; while searching it holds the filtered projection and the
//! mirror lives on in `snapshot` until the search ends. Every mutation here is
//! synchronous, so observers never see a half-applied merge or reconciliation.

use crate::search::filter_records;
use restapis_core::{sort_records, IndexRecord};

/// Browsing or searching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Browsing,
    Searching {
        query: String,
    },
}

/// State of the REST APIs list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    items: Option<Vec<IndexRecord>>,
    snapshot: Option<Vec<IndexRecord>>,
    mode: Mode,
    cursor: Option<String>,
    querying: bool,
}

impl ListState {
    /// Creates a state with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible records; `None` until something was loaded
    pub fn items(&self) -> Option<&[IndexRecord]> {
        self.items.as_deref()
    }

    /// The mirror saved when the current search started
    pub fn snapshot(&self) -> Option<&[IndexRecord]> {
        self.snapshot.as_deref()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.mode, Mode::Searching { .. })
    }

    /// Continuation token of the next page
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// True while a page request is in flight
    pub fn is_querying(&self) -> bool {
        self.querying
    }

    /// Returns the visible record at `index`
    pub fn item(&self, index: usize) -> Option<&IndexRecord> {
        self.items.as_ref().and_then(|items| items.get(index))
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn has_items(&self) -> bool {
        self.len() > 0
    }

    /// True when nothing is shown and nothing is being loaded
    pub fn data_unavailable(&self) -> bool {
        !self.has_items() && !self.querying
    }

    /// The list is hidden when it has no items, except during a search
    pub fn list_hidden(&self) -> bool {
        !self.is_searching() && !self.has_items()
    }

    /// Clears the cursor and the busy flag and empties the list
    ///
    /// The list becomes an empty sequence, not absent.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.querying = false;
        self.items = Some(Vec::new());
    }

    pub(crate) fn begin_query(&mut self) {
        self.querying = true;
    }

    pub(crate) fn finish_query(&mut self) {
        self.querying = false;
    }

    pub(crate) fn set_cursor(&mut self, cursor: Option<String>) {
        self.cursor = cursor;
    }

    /// Merges a page of records into the mirror and re-sorts it
    ///
    /// While searching the page goes to the snapshot and the visible results
    /// are filtered again, so non-matching records stay hidden.
    pub fn merge_page(&mut self, page: Vec<IndexRecord>) {
        match &self.mode {
            Mode::Browsing => merge_sorted(&mut self.items, page),
            Mode::Searching { query } => {
                merge_sorted(&mut self.snapshot, page);
                self.items = filtered(self.snapshot.as_deref(), query);
            }
        }
    }

    /// Inserts or replaces a record by id
    ///
    /// While searching, the visible results are only refreshed, never
    /// extended. A search without a saved mirror ignores the change.
    pub fn upsert(&mut self, record: IndexRecord) {
        if self.is_searching() {
            let Some(saved) = self.snapshot.as_mut() else {
                return;
            };
            if let Some(items) = self.items.as_mut() {
                if let Some(index) = position(items, &record.id) {
                    items[index] = record.clone();
                    sort_records(items);
                }
            }
            upsert_into(saved, record);
            return;
        }

        match self.items.as_mut() {
            None => self.items = Some(vec![record]),
            Some(items) => upsert_into(items, record),
        }
    }

    /// Removes a record by id
    ///
    /// While searching the record is removed from both the visible results and
    /// the snapshot, unless there is no snapshot. Returns true if any list
    /// changed.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.is_searching() {
            if self.snapshot.is_none() {
                return false;
            }
            let visible = remove(&mut self.items, id);
            let saved = remove(&mut self.snapshot, id);
            return visible || saved;
        }

        remove(&mut self.items, id)
    }

    /// Shows the records of the saved mirror matching `query`
    ///
    /// The mirror is saved on the first search only, so refining a query
    /// always filters the full list. An empty mirror yields an absent list.
    pub fn enter_search(&mut self, query: &str) {
        self.mode = Mode::Searching {
            query: query.to_string(),
        };
        if self.snapshot.is_none() {
            self.snapshot = self.items.clone();
        }

        self.items = filtered(self.snapshot.as_deref(), query);
    }

    /// Leaves search mode and restores the saved mirror
    ///
    /// Returns false when there was no mirror to restore; the list is then
    /// absent and must be reloaded.
    pub fn exit_search(&mut self) -> bool {
        self.mode = Mode::Browsing;
        self.items = self.snapshot.take();
        self.items.is_some()
    }
}

fn position(records: &[IndexRecord], id: &str) -> Option<usize> {
    records.iter().position(|record| record.id == id)
}

fn upsert_into(records: &mut Vec<IndexRecord>, record: IndexRecord) {
    match position(records, &record.id) {
        Some(index) => records[index] = record,
        None => records.push(record),
    }
    sort_records(records);
}

fn merge_sorted(list: &mut Option<Vec<IndexRecord>>, page: Vec<IndexRecord>) {
    let records = list.get_or_insert_with(Vec::new);
    records.extend(page);
    sort_records(records);
}

/// Search results over `saved`; an absent or empty mirror gives no list
fn filtered(saved: Option<&[IndexRecord]>, query: &str) -> Option<Vec<IndexRecord>> {
    match saved {
        None | Some([]) => None,
        Some(saved) => Some(filter_records(saved, query)),
    }
}

fn remove(list: &mut Option<Vec<IndexRecord>>, id: &str) -> bool {
    let Some(records) = list.as_mut() else {
        return false;
    };
    match position(records, id) {
        Some(index) => {
            records.remove(index);
            true
        }
        None => false,
    }
}
