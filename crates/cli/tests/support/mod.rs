//! Mock org and context helpers for the CLI tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};
use sfsync_cli::{execute, AppContext, Cli};
use sfsync_domain::{Config, SyncConfig};
use sfsync_infra::{HttpClient, OAuthTokenClient, SalesforceClient};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DATA_PATH: &str = "/services/data/v59.0";
pub const TOKEN_PATH: &str = "/services/oauth2/token";

/// Mock server answering the login and the `Account` describe
pub async fn org() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "00D!cli",
            "instance_url": server.uri(),
            "id": "https://login.salesforce.com/id/00Dxx0000001gPL/005xx000001Sv6A",
            "token_type": "Bearer",
            "issued_at": "1700000000000",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DATA_PATH}/sobjects/Account/describe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_describe()))
        .mount(&server)
        .await;
    server
}

pub fn account_describe() -> Value {
    json!({
        "name": "Account",
        "fields": [
            {"name": "Id", "type": "id", "createable": false, "nillable": false, "defaultedOnCreate": true},
            {"name": "Name", "type": "string", "length": 255, "createable": true, "nillable": false, "defaultedOnCreate": false},
            {"name": "Type", "type": "picklist", "createable": true, "nillable": true,
             "picklistValues": [{"value": "Customer", "active": true}, {"value": "Prospect", "active": true}]},
            {"name": "Industry", "type": "picklist", "createable": true, "nillable": true,
             "picklistValues": [{"value": "Technology", "active": true}]},
            {"name": "Phone", "type": "phone", "length": 40, "createable": true, "nillable": true},
            {"name": "Website", "type": "url", "length": 255, "createable": true, "nillable": true},
            {"name": "AccountNumber", "type": "string", "length": 40, "createable": true, "nillable": true},
            {"name": "NumberOfEmployees", "type": "int", "digits": 8, "createable": true, "nillable": true},
            {"name": "CreatedDate", "type": "datetime", "createable": false, "nillable": false, "defaultedOnCreate": true}
        ]
    })
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.salesforce.username = "cli@example.com".into();
    config.salesforce.password = "secret".into();
    config.salesforce.security_token = "XYZ".into();
    config.salesforce.api_version = "59.0".into();
    config.sync = SyncConfig { max_attempts: 2, base_backoff_ms: 1, max_backoff_ms: 2, ..SyncConfig::default() };
    config
}

pub async fn context(server: &MockServer, dry_run: bool) -> AppContext {
    let http = HttpClient::builder().timeout(Duration::from_secs(2)).build().unwrap();
    let endpoint = Arc::new(OAuthTokenClient::new(http.clone(), format!("{}{TOKEN_PATH}", server.uri())));
    let store = Arc::new(SalesforceClient::new(http, "59.0"));
    AppContext::with_adapters(config(), endpoint, store, dry_run).await.unwrap()
}

/// Parse `args` as a command line and run it; returns (success, stdout)
pub async fn run(ctx: &AppContext, args: &[&str]) -> anyhow::Result<(bool, String)> {
    let cli = Cli::try_parse_from(std::iter::once("sfsync").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    let success = execute(ctx, cli.command, &CancellationToken::new(), &mut out).await?;
    Ok((success, String::from_utf8(out)?))
}

pub fn saved(ids: &[&str]) -> ResponseTemplate {
    let results: Vec<Value> = ids.iter().map(|id| json!({"id": id, "success": true, "errors": []})).collect();
    ResponseTemplate::new(200).set_body_json(results)
}
