//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Error as HttpError, StatusCode};
use serde::Deserialize;
use sfsync_domain::SyncError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

/// Transport failure; `timeout` is the configured per-request limit
pub(crate) fn transport_error(err: &HttpError, timeout: Duration) -> SyncError {
    if err.is_timeout() {
        return SyncError::Timeout(timeout);
    }
    if err.is_connect() {
        return SyncError::Network(format!("HTTP connection failure: {err}"));
    }
    if err.is_decode() {
        return SyncError::Serialization(format!("invalid HTTP response body: {err}"));
    }
    if let Some(status) = err.status() {
        return status_error(status, &HeaderMap::new(), "");
    }
    SyncError::Network(err.to_string())
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(transport_error(&value, Duration::ZERO))
    }
}

/* -------------------------------------------------------------------------- */
/* HTTP status → SyncError */
/* -------------------------------------------------------------------------- */

/// Error entry of a REST failure body: `[{"errorCode": .., "message": ..}]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestFault {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

/// OAuth failure body: `{"error": .., "error_description": ..}`
#[derive(Debug, Deserialize)]
struct OAuthFault {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Human-readable detail of a failure body, whatever its shape
fn describe_body(body: &str) -> Option<String> {
    if let Ok(faults) = serde_json::from_str::<Vec<RestFault>>(body) {
        let joined = faults
            .iter()
            .map(|fault| match (fault.error_code.is_empty(), fault.message.is_empty()) {
                (false, false) => format!("{}: {}", fault.error_code, fault.message),
                (false, true) => fault.error_code.clone(),
                _ => fault.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return (!joined.is_empty()).then_some(joined);
    }
    if let Ok(fault) = serde_json::from_str::<OAuthFault>(body) {
        return Some(if fault.error_description.is_empty() {
            fault.error
        } else {
            format!("{}: {}", fault.error, fault.error_description)
        });
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(500).collect())
}

/// `Retry-After` in delta-seconds; HTTP-date values are ignored
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a non-success response onto the error taxonomy
///
/// 401 is `Unauthorized` so the session can renew; 429 and 5xx are
/// retryable; every other status is a permanent `Remote` failure.
pub fn status_error(status: StatusCode, headers: &HeaderMap, body: &str) -> SyncError {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let message = describe_body(body).unwrap_or_else(|| format!("HTTP {code} {reason}"));

    match code {
        401 => SyncError::Unauthorized(message),
        429 => SyncError::RateLimited { message, retry_after: retry_after(headers) },
        500..=599 => SyncError::Network(format!("HTTP {code} {reason}: {message}")),
        _ => SyncError::Remote { status: code, message },
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
