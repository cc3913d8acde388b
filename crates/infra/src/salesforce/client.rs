//! REST adapter implementing the object store port

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::Value as JsonValue;
use sfsync_core::ObjectStore;
use sfsync_domain::constants::{ATTRIBUTES_KEY, DEFAULT_API_VERSION, ID_FIELD};
use sfsync_domain::{
    Chunk, Config, ObjectSchema, Operation, QueryPage, RecordOutcome, Result, SyncError, TokenSet, WireRecord,
};
use tracing::{debug, instrument};
use url::Url;

use super::describe::into_schema;
use super::types::{CollectionRequest, DescribeResponse, QueryResponse, SaveResult};
use crate::http::HttpClient;

/// Salesforce REST client for describe, query and sObject collections
///
/// The instance URL comes from the token on every call, so one client can
/// serve a session across credential renewals.
#[derive(Clone)]
pub struct SalesforceClient {
    http: HttpClient,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(http: HttpClient, api_version: impl Into<String>) -> Self {
        Self { http, api_version: api_version.into() }
    }

    /// Client with the configured API version and request timeout.
    ///
    /// # Errors
    /// `Internal` when the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http =
            HttpClient::builder().timeout(Duration::from_secs(config.sync.request_timeout_secs)).build()?;
        let version = if config.salesforce.api_version.trim().is_empty() {
            DEFAULT_API_VERSION
        } else {
            config.salesforce.api_version.trim()
        };
        Ok(Self::new(http, version))
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `{instance}/services/data/v{version}/{segments..}`
    fn data_url(&self, token: &TokenSet, segments: &[&str]) -> Result<Url> {
        let mut url = instance_url(token)?;
        let version = format!("v{}", self.api_version);
        url.path_segments_mut()
            .map_err(|()| SyncError::Config(format!("instance URL cannot be a base: {}", token.instance_url)))?
            .pop_if_empty()
            .extend(["services", "data", version.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, method: Method, url: Url, token: &TokenSet) -> Result<RequestBuilder> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .map_err(|_| SyncError::Unauthorized("access token is not a valid header value".to_string()))?;
        Ok(self.http.request(method, url).header(AUTHORIZATION, bearer))
    }

    async fn save(&self, request: RequestBuilder, expected: usize) -> Result<Vec<RecordOutcome>> {
        let results: Vec<SaveResult> = self.http.send_json(request).await?;
        if results.len() != expected {
            return Err(SyncError::Internal(format!(
                "collection response has {} results for {expected} records",
                results.len()
            )));
        }
        Ok(results.into_iter().enumerate().map(|(index, result)| result.into_outcome(index)).collect())
    }
}

fn instance_url(token: &TokenSet) -> Result<Url> {
    Url::parse(&token.instance_url)
        .map_err(|err| SyncError::Config(format!("invalid instance URL {}: {err}", token.instance_url)))
}

/// Wire records with the `attributes.type` marker the collection API needs
fn typed_records(chunk: &Chunk) -> Vec<WireRecord> {
    chunk
        .records
        .iter()
        .map(|record| {
            let mut typed = WireRecord::with_capacity(record.len() + 1);
            typed.insert(ATTRIBUTES_KEY.to_string(), serde_json::json!({ "type": chunk.object_type }));
            typed.extend(record.iter().filter(|(key, _)| key.as_str() != ATTRIBUTES_KEY).map(|(k, v)| (k.clone(), v.clone())));
            typed
        })
        .collect()
}

fn record_ids(chunk: &Chunk) -> Result<Vec<String>> {
    chunk
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| match record.get(ID_FIELD) {
            Some(JsonValue::String(id)) if !id.is_empty() => Ok(id.clone()),
            _ => Err(SyncError::InvalidJob(format!("delete record {index} has no Id"))),
        })
        .collect()
}

#[async_trait]
impl ObjectStore for SalesforceClient {
    #[instrument(skip(self, token))]
    async fn describe(&self, token: &TokenSet, object_type: &str) -> Result<ObjectSchema> {
        let url = self.data_url(token, &["sobjects", object_type, "describe"])?;
        let response: DescribeResponse = self.http.send_json(self.authorized(Method::GET, url, token)?).await?;
        let schema = into_schema(response)?;
        debug!(object_type, fields = schema.fields().len(), "describe mapped");
        Ok(schema)
    }

    #[instrument(skip(self, token, soql))]
    async fn query(&self, token: &TokenSet, soql: &str) -> Result<QueryPage> {
        let mut url = self.data_url(token, &["query"])?;
        url.query_pairs_mut().append_pair("q", soql);
        debug!(soql, "running query");
        let response: QueryResponse = self.http.send_json(self.authorized(Method::GET, url, token)?).await?;
        Ok(response.into())
    }

    #[instrument(skip(self, token))]
    async fn query_more(&self, token: &TokenSet, locator: &str) -> Result<QueryPage> {
        let url = instance_url(token)?
            .join(locator)
            .map_err(|err| SyncError::Internal(format!("invalid next-records locator {locator}: {err}")))?;
        let response: QueryResponse = self.http.send_json(self.authorized(Method::GET, url, token)?).await?;
        Ok(response.into())
    }

    #[instrument(skip(self, token, chunk), fields(object_type = %chunk.object_type, operation = %chunk.operation, records = chunk.records.len()))]
    async fn submit(&self, token: &TokenSet, chunk: &Chunk) -> Result<Vec<RecordOutcome>> {
        let expected = chunk.records.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let request = match chunk.operation {
            Operation::Create | Operation::Update => {
                let method = if chunk.operation == Operation::Create { Method::POST } else { Method::PATCH };
                let url = self.data_url(token, &["composite", "sobjects"])?;
                let body = CollectionRequest { all_or_none: chunk.all_or_none, records: typed_records(chunk) };
                self.authorized(method, url, token)?.json(&body)
            }
            Operation::Upsert => {
                let external_id = chunk
                    .external_id_field
                    .as_deref()
                    .ok_or_else(|| SyncError::InvalidJob("upsert requires an external id field".to_string()))?;
                let url =
                    self.data_url(token, &["composite", "sobjects", chunk.object_type.as_str(), external_id])?;
                let body = CollectionRequest { all_or_none: chunk.all_or_none, records: typed_records(chunk) };
                self.authorized(Method::PATCH, url, token)?.json(&body)
            }
            Operation::Delete => {
                let mut url = self.data_url(token, &["composite", "sobjects"])?;
                url.query_pairs_mut()
                    .append_pair("ids", &record_ids(chunk)?.join(","))
                    .append_pair("allOrNone", if chunk.all_or_none { "true" } else { "false" });
                self.authorized(Method::DELETE, url, token)?
            }
        };

        self.save(request, expected).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(instance: &str) -> TokenSet {
        TokenSet::new("00Dxx!token", instance)
    }

    fn chunk(operation: Operation, records: Vec<serde_json::Value>) -> Chunk {
        Chunk {
            object_type: "Account".into(),
            operation,
            records: records
                .into_iter()
                .filter_map(|value| match value {
                    JsonValue::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            external_id_field: None,
            all_or_none: false,
        }
    }

    #[test]
    fn data_url_is_versioned_and_escaped() {
        let client = SalesforceClient::new(HttpClient::new().unwrap(), "59.0");
        let url = client.data_url(&token("https://acme.my.salesforce.com/"), &["sobjects", "Account", "describe"]).unwrap();
        assert_eq!(url.as_str(), "https://acme.my.salesforce.com/services/data/v59.0/sobjects/Account/describe");

        let odd = client.data_url(&token("https://acme.my.salesforce.com"), &["sobjects", "A/B"]).unwrap();
        assert!(odd.as_str().ends_with("/sobjects/A%2FB"));
    }

    #[test]
    fn collection_records_carry_their_type() {
        let chunk = chunk(Operation::Create, vec![serde_json::json!({"Name": "Acme", "attributes": {"type": "Contact"}})]);
        let typed = typed_records(&chunk);
        assert_eq!(typed[0]["attributes"]["type"], "Account");
        assert_eq!(typed[0]["Name"], "Acme");
        assert_eq!(typed[0].len(), 2);
    }

    #[test]
    fn delete_requires_ids() {
        let good = chunk(Operation::Delete, vec![serde_json::json!({"Id": "001A"}), serde_json::json!({"Id": "001B"})]);
        assert_eq!(record_ids(&good).unwrap(), vec!["001A", "001B"]);

        let bad = chunk(Operation::Delete, vec![serde_json::json!({"Name": "x"})]);
        assert!(matches!(record_ids(&bad), Err(SyncError::InvalidJob(_))));
    }

    #[test]
    fn blank_configured_version_falls_back() {
        let mut config = Config::default();
        config.salesforce.api_version = " ".into();
        assert_eq!(SalesforceClient::from_config(&config).unwrap().api_version(), "59.0");
    }
}
