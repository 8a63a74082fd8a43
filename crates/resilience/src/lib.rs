// crates/resilience/src/lib.rs
//! Timing helpers for datastore-facing operations
//!
//! This module provides:
//! - Debouncing: coalesce bursts of triggers into one scheduled task
//! - Timeout handling for async requests
//!
//! # Example
//!
//! ```rust
//! use restapis_resilience::{Debouncer, Timeout};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let debouncer = Debouncer::new(Duration::from_millis(20));
//! assert!(debouncer.schedule(async {}).unwrap());
//! assert!(!debouncer.schedule(async {}).unwrap());
//!
//! let timeout = Timeout::new(Duration::from_secs(5));
//! let value = timeout.execute(async { 42 }).await;
//! assert_eq!(value.ok(), Some(42));
//! # }
//! ```

mod debounce;
mod error;
mod timeout;

pub use debounce::Debouncer;
pub use error::{ResilienceError, ResilienceResult};
pub use timeout::{with_timeout, Timeout};
