//! Configuration structures
//!
//! Loading (file + environment) lives in the infra crate; this module only
//! defines the shape and the defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_VERSION, DEFAULT_LOGIN_DOMAIN, SYNC_CHUNK_LIMIT};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub salesforce: SalesforceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Connection and credential settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesforceConfig {
    pub username: String,
    pub password: String,
    pub security_token: String,
    /// Login host prefix: `login` for production, `test` for sandboxes
    pub domain: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub api_version: String,
    /// Assumed access-token lifetime; the token endpoint does not report one
    pub session_ttl_secs: Option<u64>,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            security_token: String::new(),
            domain: DEFAULT_LOGIN_DOMAIN.to_string(),
            consumer_key: None,
            consumer_secret: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            session_ttl_secs: None,
        }
    }
}

impl SalesforceConfig {
    /// Names of required keys that are empty
    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        [
            ("username", &self.username),
            ("password", &self.password),
            ("security_token", &self.security_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    /// `https://{domain}.salesforce.com/services/oauth2/token`
    pub fn token_url(&self) -> String {
        format!("https://{}.salesforce.com/services/oauth2/token", self.domain)
    }
}

impl fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

/// Batch and transport tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub chunk_size: usize,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: SYNC_CHUNK_LIMIT,
            max_attempts: 3,
            base_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.salesforce.domain, "login");
        assert_eq!(config.salesforce.api_version, "59.0");
        assert_eq!(config.sync.chunk_size, 200);
        assert_eq!(config.sync.max_attempts, 3);
        assert_eq!(
            config.salesforce.token_url(),
            "https://login.salesforce.com/services/oauth2/token"
        );
    }

    #[test]
    fn missing_keys_are_all_reported() {
        let mut config = SalesforceConfig { username: "ops@example.com".into(), ..Default::default() };
        assert_eq!(config.missing_required_keys(), vec!["password", "security_token"]);

        config.password = "pw".into();
        config.security_token = "tok".into();
        assert!(config.missing_required_keys().is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"salesforce":{"domain":"test"}}"#).unwrap();
        assert_eq!(config.salesforce.domain, "test");
        assert_eq!(config.salesforce.api_version, "59.0");
        assert_eq!(config.sync.request_timeout_secs, 30);
    }
}
