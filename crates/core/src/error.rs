//! Errors reported by the index datastore model
//!
//! The list engine never owns records; every failure it sees comes from the
//! collaborator that stores them. Query failures are recoverable by refreshing,
//! remove failures are handed back to whoever asked for the removal.

use thiserror::Error;

/// Result type for datastore model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors the index datastore model can report
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Listing the index failed
    #[error("Index query failed: {message}")]
    QueryFailed { message: String },

    /// Removing a record failed
    #[error("Failed to remove {id}: {message}")]
    RemoveFailed { id: String, message: String },

    /// Record does not exist in the datastore
    #[error("Record not found: {id}")]
    NotFound { id: String },

    /// The datastore cannot be reached
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    /// Record rejected by the datastore
    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// The datastore did not answer in time
    #[error("Datastore request timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl ModelError {
    /// Creates a query failure
    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Creates a remove failure
    pub fn remove(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoveFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Returns true if repeating the request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QueryFailed { .. } | Self::Unavailable(_) | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = ModelError::query("store closed");
        assert_eq!(err.to_string(), "Index query failed: store closed");
    }

    #[test]
    fn test_remove_error_display() {
        let err = ModelError::remove("api-1", "locked");
        assert!(err.to_string().contains("api-1"));
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_timeout_display() {
        let err = ModelError::Timeout { millis: 250 };
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_retryable() {
        assert!(ModelError::query("x").is_retryable());
        assert!(ModelError::Unavailable("offline".to_string()).is_retryable());
        assert!(ModelError::Timeout { millis: 1 }.is_retryable());
        assert!(!ModelError::remove("a", "b").is_retryable());
        assert!(!ModelError::NotFound { id: "a".to_string() }.is_retryable());
        assert!(!ModelError::InvalidRecord { reason: "x".to_string() }.is_retryable());
    }
}
