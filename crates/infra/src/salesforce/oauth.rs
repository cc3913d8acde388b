//! OAuth 2.0 token endpoint client

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use sfsync_core::TokenEndpoint;
use sfsync_domain::{Config, Grant, Result, SyncError, TokenSet};
use tracing::{info, instrument};
use url::form_urlencoded;

use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    issued_at: Option<String>,
}

impl TokenResponse {
    fn issued_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.issued_at.as_deref()?.parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    fn into_token_set(self) -> TokenSet {
        let issued_at = self.issued_at();
        let mut token = TokenSet::new(self.access_token, self.instance_url);
        if let Some(refresh_token) = self.refresh_token {
            token = token.with_refresh_token(refresh_token);
        }
        if let Some(issued_at) = issued_at {
            token.issued_at = issued_at;
        }
        token
    }
}

/// Exchanges grants at `https://{domain}.salesforce.com/services/oauth2/token`
pub struct OAuthTokenClient {
    http: HttpClient,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl OAuthTokenClient {
    pub fn new(http: HttpClient, token_url: impl Into<String>) -> Self {
        Self { http, token_url: token_url.into(), client_id: None, client_secret: None }
    }

    /// Client for the configured login domain and connected app.
    ///
    /// # Errors
    /// `Internal` when the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http =
            HttpClient::builder().timeout(Duration::from_secs(config.sync.request_timeout_secs)).build()?;
        let mut client = Self::new(http, config.salesforce.token_url());
        client.client_id = config.salesforce.consumer_key.clone().filter(|key| !key.is_empty());
        client.client_secret = config.salesforce.consumer_secret.clone().filter(|secret| !secret.is_empty());
        Ok(client)
    }

    pub fn with_client_credentials(mut self, client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = client_secret;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn form_body(&self, grant: &Grant) -> String {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", grant.grant_type());

        match grant {
            Grant::Password { username, password, security_token } => {
                form.append_pair("username", username);
                form.append_pair("password", &format!("{password}{security_token}"));
            }
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.append_pair("code", code);
                form.append_pair("redirect_uri", redirect_uri);
            }
            Grant::RefreshToken { refresh_token } => {
                form.append_pair("refresh_token", refresh_token);
            }
        }

        if let Some(client_id) = &self.client_id {
            form.append_pair("client_id", client_id);
        }
        if let Some(client_secret) = &self.client_secret {
            form.append_pair("client_secret", client_secret);
        }
        form.finish()
    }
}

#[async_trait]
impl TokenEndpoint for OAuthTokenClient {
    #[instrument(skip(self, grant), fields(grant_type = grant.grant_type()))]
    async fn request_token(&self, grant: &Grant) -> Result<TokenSet> {
        let request = self
            .http
            .request(Method::POST, self.token_url.as_str())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
            .body(self.form_body(grant));

        let response: TokenResponse = self.http.send_json(request).await.map_err(|err| match err {
            // invalid_grant and friends come back as 400
            SyncError::Remote { status: 400 | 403, message } => SyncError::Unauthorized(message),
            other => other,
        })?;

        let token = response.into_token_set();
        info!(instance_url = %token.instance_url, "token issued");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuthTokenClient {
        OAuthTokenClient::new(HttpClient::new().unwrap(), "https://login.salesforce.com/services/oauth2/token")
    }

    #[test]
    fn password_grant_appends_the_security_token() {
        let body = client().form_body(&Grant::Password {
            username: "ops@example.com".into(),
            password: "p&ss".into(),
            security_token: "XYZ".into(),
        });
        assert_eq!(body, "grant_type=password&username=ops%40example.com&password=p%26ssXYZ");
    }

    #[test]
    fn client_credentials_are_sent_when_configured() {
        let body = client()
            .with_client_credentials("3MVG9", Some("s3cret".into()))
            .form_body(&Grant::RefreshToken { refresh_token: "5Aep".into() });
        assert_eq!(body, "grant_type=refresh_token&refresh_token=5Aep&client_id=3MVG9&client_secret=s3cret");
    }

    #[test]
    fn token_url_follows_the_login_domain() {
        let mut config = Config::default();
        config.salesforce.domain = "test".into();
        config.salesforce.consumer_key = Some(String::new());
        let client = OAuthTokenClient::from_config(&config).unwrap();
        assert_eq!(client.token_url(), "https://test.salesforce.com/services/oauth2/token");
        assert!(client.client_id.is_none());
    }

    #[test]
    fn issued_at_is_read_from_milliseconds() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"00D!x","instance_url":"https://na1.example.com","issued_at":"1700000000000"}"#,
        )
        .unwrap();
        let token = response.into_token_set();
        assert_eq!(token.issued_at.timestamp(), 1_700_000_000);
        assert!(token.refresh_token.is_none());
    }
}
