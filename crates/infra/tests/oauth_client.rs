//! OAuth token endpoint client against a mock login server

mod support;

use serde_json::json;
use sfsync_core::TokenEndpoint;
use sfsync_domain::{Grant, SyncError};
use support::{oauth, password_grant, token_reply, TOKEN_PATH};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn password_grant_yields_a_token_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=integration%40example.com"))
        .and(body_string_contains("password=secretXYZ"))
        .respond_with(token_reply(&server, "00D!first", None))
        .expect(1)
        .mount(&server)
        .await;

    let token = oauth(&server).request_token(&password_grant()).await.unwrap();

    assert_eq!(token.access_token, "00D!first");
    assert_eq!(token.instance_url, server.uri());
    assert!(token.refresh_token.is_none());
    assert!(token.expires_at.is_none());
}

#[tokio::test]
async fn refresh_grant_sends_client_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=5Aep861"))
        .and(body_string_contains("client_id=3MVG9"))
        .respond_with(token_reply(&server, "00D!second", Some("5Aep861")))
        .expect(1)
        .mount(&server)
        .await;

    let token = oauth(&server)
        .with_client_credentials("3MVG9", None)
        .request_token(&Grant::RefreshToken { refresh_token: "5Aep861".into() })
        .await
        .unwrap();

    assert_eq!(token.access_token, "00D!second");
    assert_eq!(token.refresh_token.as_deref(), Some("5Aep861"));
}

#[tokio::test]
async fn rejected_grant_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .mount(&server)
        .await;

    let result = oauth(&server).request_token(&password_grant()).await;

    assert!(matches!(result, Err(SyncError::Unauthorized(message)) if message == "invalid_grant: authentication failure"));
}

#[tokio::test]
async fn login_outage_stays_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let result = oauth(&server).request_token(&password_grant()).await;

    assert!(matches!(result, Err(SyncError::Network(_))));
}
