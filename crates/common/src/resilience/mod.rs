//! Resilience patterns for remote calls
//!
//! Only retry with exponential backoff lives here. The policy is consumed by
//! the batch executor (per chunk) and by the query cursor (per page).

pub mod retry;

pub use retry::{BackoffStrategy, RetryDecision, RetryPolicy};
