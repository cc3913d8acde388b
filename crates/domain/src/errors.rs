//! Error types used throughout the sync engine

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sfsync_common::error::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Main error type for sfsync
///
/// Validation failures are not errors: they are reported as data in a
/// `ValidationResult`. Transport failures raised while a batch is running are
/// folded into per-record outcomes and never escape the executor.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum SyncError {
    #[error("Schema discovery failed for {object_type}: {message}")]
    SchemaDiscovery { object_type: String, message: String },

    #[error("Unknown field {field} on {object_type}")]
    UnknownField { object_type: String, field: String },

    #[error("Field {field} on {object_type} has no wire mapping")]
    UnmappedField { object_type: String, field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid batch job: {0}")]
    InvalidJob(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication expired: {0}")]
    AuthenticationExpired(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited: {message}")]
    RateLimited { message: String, retry_after: Option<Duration> },

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Record rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{matches} records match {field} = {value}")]
    AmbiguousMatch { field: String, value: String, matches: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Stable snake_case code, used for per-record outcome errors and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaDiscovery { .. } => "schema_discovery",
            Self::UnknownField { .. } => "unknown_field",
            Self::UnmappedField { .. } => "unmapped_field",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidJob(_) => "invalid_job",
            Self::NotAuthenticated => "not_authenticated",
            Self::AuthenticationExpired(_) => "authentication_expired",
            Self::Unauthorized(_) => "unauthorized",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::Remote { .. } => "remote",
            Self::Rejected { .. } => "rejected",
            Self::NotFound(_) => "not_found",
            Self::AmbiguousMatch { .. } => "ambiguous_match",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// True for the 401-style response that a credential refresh may cure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl ErrorClassification for SyncError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled | Self::NotFound(_) => ErrorSeverity::Info,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => ErrorSeverity::Warning,
            Self::Remote { status, .. } if *status >= 500 => ErrorSeverity::Warning,
            Self::AuthenticationExpired(_) | Self::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for sfsync operations
pub type Result<T> = std::result::Result<T, SyncError>;
