//! Error classification shared by every sfsync error type
//!
//! Library crates define their own `thiserror` enums; this module only
//! provides the vocabulary the retry machinery and the logging layer use to
//! reason about them:
//!
//! - **`ErrorClassification`**: retryability, severity, criticality and an
//!   optional server-suggested retry delay
//! - **`ErrorSeverity`**: a unified severity scale for log levels
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Cancelled job, empty result |
//! | **Warning** | Degraded but operational | Rate limiting, transient network failures |
//! | **Error** | Failure requiring attention | Rejected request, bad configuration |
//! | **Critical** | Integrity at risk | Revoked credentials, internal invariant violations |
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfsync_common::error::ErrorClassification;
//!
//! fn log_level_for<E: ErrorClassification>(err: &E) -> &'static str {
//!     if err.is_critical() { "error" } else if err.is_retryable() { "warn" } else { "info" }
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, connection failures, rate
    /// limiting and temporary server unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the remote side recommended a delay
    /// (e.g. a `Retry-After` header).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
