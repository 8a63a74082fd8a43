// crates/list-sync/src/search.rs
//! Free-text matching over index records

use restapis_core::IndexRecord;
use std::fmt::Display;

/// Normalizes a user query for matching
///
/// The query is lowercased and a single leading `_` is dropped, so queries
/// typed as datastore ids (`_abc`) match the id body.
pub fn prepare_query<Q: Display + ?Sized>(query: &Q) -> String {
    let query = query.to_string().to_lowercase();
    match query.strip_prefix('_') {
        Some(rest) => rest.to_string(),
        None => query,
    }
}

/// Returns true if `record` matches a query prepared by [`prepare_query`]
///
/// Id and title are compared case-insensitively. The description is compared
/// as stored, so an uppercase letter in a description never matches.
pub fn matches(record: &IndexRecord, prepared: &str) -> bool {
    if record.id.to_lowercase().contains(prepared) {
        return true;
    }
    if record
        .title
        .as_ref()
        .is_some_and(|title| title.to_lowercase().contains(prepared))
    {
        return true;
    }
    record
        .description
        .as_ref()
        .is_some_and(|description| description.contains(prepared))
}

/// Filters `records` by `query`, keeping their order
pub fn filter_records<Q: Display + ?Sized>(records: &[IndexRecord], query: &Q) -> Vec<IndexRecord> {
    let prepared = prepare_query(query);
    records
        .iter()
        .filter(|record| matches(record, &prepared))
        .cloned()
        .collect()
}
