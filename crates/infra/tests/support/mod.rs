//! Mock Salesforce org shared by the integration tests
#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use sfsync_domain::{Grant, TokenSet};
use sfsync_infra::{HttpClient, OAuthTokenClient, SalesforceClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_VERSION: &str = "59.0";
pub const DATA_PATH: &str = "/services/data/v59.0";
pub const TOKEN_PATH: &str = "/services/oauth2/token";

pub fn http() -> HttpClient {
    match HttpClient::builder().timeout(Duration::from_secs(2)).build() {
        Ok(client) => client,
        Err(err) => panic!("HTTP client: {err}"),
    }
}

pub fn salesforce() -> SalesforceClient {
    SalesforceClient::new(http(), API_VERSION)
}

pub fn oauth(server: &MockServer) -> OAuthTokenClient {
    OAuthTokenClient::new(http(), format!("{}{TOKEN_PATH}", server.uri()))
}

/// Token pointing the adapter at the mock server
pub fn token_for(server: &MockServer, access_token: &str) -> TokenSet {
    TokenSet::new(access_token, server.uri())
}

pub fn password_grant() -> Grant {
    Grant::Password {
        username: "integration@example.com".into(),
        password: "secret".into(),
        security_token: "XYZ".into(),
    }
}

/// Token endpoint reply for `access_token`
pub fn token_reply(server: &MockServer, access_token: &str, refresh_token: Option<&str>) -> ResponseTemplate {
    let mut body = json!({
        "access_token": access_token,
        "instance_url": server.uri(),
        "id": "https://login.salesforce.com/id/00Dxx0000001gPL/005xx000001Sv6A",
        "token_type": "Bearer",
        "issued_at": "1700000000000",
        "signature": "c2lnbmF0dXJl",
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

/// Abbreviated `Account` describe
pub fn account_describe() -> Value {
    json!({
        "name": "Account",
        "label": "Account",
        "fields": [
            {"name": "Id", "label": "Account ID", "type": "id", "createable": false, "nillable": false, "defaultedOnCreate": true},
            {"name": "Name", "label": "Account Name", "type": "string", "length": 255, "createable": true, "nillable": false, "defaultedOnCreate": false},
            {"name": "Type", "label": "Account Type", "type": "picklist", "createable": true, "nillable": true,
             "picklistValues": [
                {"value": "Customer", "active": true},
                {"value": "Partner", "active": true},
                {"value": "Prospect", "active": true},
                {"value": "Other", "active": false}
             ]},
            {"name": "Industry", "type": "picklist", "createable": true, "nillable": true,
             "picklistValues": [{"value": "Technology", "active": true}, {"value": "Energy", "active": true}]},
            {"name": "Phone", "label": "Account Phone", "type": "phone", "length": 40, "createable": true, "nillable": true},
            {"name": "Website", "type": "url", "length": 255, "createable": true, "nillable": true},
            {"name": "AccountNumber", "type": "string", "length": 40, "createable": true, "nillable": true},
            {"name": "AnnualRevenue", "type": "currency", "precision": 18, "scale": 0, "createable": true, "nillable": true},
            {"name": "NumberOfEmployees", "type": "int", "digits": 8, "createable": true, "nillable": true},
            {"name": "BillingAddress", "type": "address", "createable": false, "nillable": true},
            {"name": "BillingCity", "type": "string", "length": 40, "createable": true, "nillable": true},
            {"name": "ParentId", "type": "reference", "createable": true, "nillable": true,
             "referenceTo": ["Account"], "relationshipName": "Parent"},
            {"name": "CreatedDate", "type": "datetime", "createable": false, "nillable": false, "defaultedOnCreate": true}
        ]
    })
}

pub async fn mount_account_describe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{DATA_PATH}/sobjects/Account/describe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_describe()))
        .mount(server)
        .await;
}

/// Collection reply with one successful result per id
pub fn saved(ids: &[&str]) -> ResponseTemplate {
    let results: Vec<Value> = ids.iter().map(|id| json!({"id": id, "success": true, "errors": []})).collect();
    ResponseTemplate::new(200).set_body_json(results)
}

pub fn object(value: Value) -> sfsync_domain::WireRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}
