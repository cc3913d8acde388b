//! Credential types shared by the session and the token endpoint

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Access credential issued by the token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Base URL all data requests go to
    pub instance_url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    pub fn new(access_token: impl Into<String>, instance_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            instance_url: instance_url.into(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Apply a lifetime when the endpoint did not report one
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = ttl.map(|ttl| self.issued_at + ttl);
        }
        self
    }

    /// Expired, or expiring within `threshold`; no expiry means never
    pub fn is_expired(&self, threshold: Duration) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() + threshold >= expires_at)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("instance_url", &self.instance_url)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credential exchanged at the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub enum Grant {
    /// Username + password; the security token is appended to the password
    Password { username: String, password: String, security_token: String },
    AuthorizationCode { code: String, redirect_uri: String },
    RefreshToken { refresh_token: String },
}

impl Grant {
    /// OAuth `grant_type` value
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::AuthorizationCode { redirect_uri, .. } => f
                .debug_struct("AuthorizationCode")
                .field("redirect_uri", redirect_uri)
                .finish_non_exhaustive(),
            Self::RefreshToken { .. } => f.debug_struct("RefreshToken").finish_non_exhaustive(),
        }
    }
}

/// Observable state of a credential session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Unauthenticated,
    Authenticated,
    Expired,
    Revoked,
}

impl_domain_status_conversions!(AuthStatus {
    Unauthenticated => "unauthenticated",
    Authenticated => "authenticated",
    Expired => "expired",
    Revoked => "revoked",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_without_expiry_never_expires() {
        let token = TokenSet::new("abc", "https://na1.example.com");
        assert!(!token.is_expired(Duration::minutes(5)));
    }

    #[test]
    fn token_expiry_honors_threshold() {
        let token = TokenSet::new("abc", "https://na1.example.com")
            .with_expiry(Utc::now() + Duration::minutes(3));
        assert!(!token.is_expired(Duration::zero()));
        assert!(token.is_expired(Duration::minutes(5)));
    }

    #[test]
    fn default_ttl_only_fills_missing_expiry() {
        let token = TokenSet::new("abc", "https://x").with_default_ttl(Some(Duration::hours(2)));
        assert_eq!(token.expires_at, Some(token.issued_at + Duration::hours(2)));

        let fixed = Utc::now() + Duration::minutes(1);
        let token = TokenSet::new("abc", "https://x")
            .with_expiry(fixed)
            .with_default_ttl(Some(Duration::hours(2)));
        assert_eq!(token.expires_at, Some(fixed));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let grant = Grant::Password {
            username: "ops@example.com".into(),
            password: "hunter2".into(),
            security_token: "tok".into(),
        };
        let rendered = format!("{grant:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tok\""));
        assert_eq!(grant.grant_type(), "password");

        let token = TokenSet::new("secret-access", "https://x");
        assert!(!format!("{token:?}").contains("secret-access"));
    }
}
