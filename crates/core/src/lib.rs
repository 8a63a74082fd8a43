pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{ModelError, ModelResult};
pub use types::{sort_records, IndexPage, IndexRecord, ListOptions, Validator};
