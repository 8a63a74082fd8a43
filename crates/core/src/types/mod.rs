//! Domain types for the REST APIs index
//!
//! - `record`: index entries and their display ordering
//! - `page`: request and response payloads of the paginated index query
//! - `common`: shared traits and string collation

mod common;
mod page;
mod record;

pub use common::{collate, Validator};
pub use page::{IndexPage, ListOptions};
pub use record::{sort_records, IndexRecord};
