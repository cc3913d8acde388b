//! In-memory object store
//!
//! Describes the fixture account schema, assigns ids to submitted records and
//! serves scripted query pages. Failures are injected three ways:
//! - a queue of errors returned by the next submit calls, in order
//! - a predicate failing every chunk it matches, on every attempt
//! - per-record rejection of records named `REJECT`

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as Json;
use sfsync_core::ObjectStore;
use sfsync_domain::{
    Chunk, ObjectSchema, Operation, QueryPage, RecordError, RecordOutcome, Result, SyncError, TokenSet,
    WireRecord,
};

use super::fixtures::account_schema;

pub const REJECTED_NAME: &str = "REJECT";

type ChunkFault = dyn Fn(&Chunk) -> Option<SyncError> + Send + Sync;

pub struct FakeStore {
    schema: ObjectSchema,
    bulk: bool,
    describes: AtomicUsize,
    submit_calls: AtomicUsize,
    next_id: AtomicUsize,
    transient: Mutex<VecDeque<SyncError>>,
    chunk_fault: Option<Box<ChunkFault>>,
    stale_tokens: Mutex<Vec<String>>,
    submitted: Mutex<Vec<Chunk>>,
    pages: Vec<QueryPage>,
    queries: Mutex<Vec<String>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            schema: account_schema(),
            bulk: false,
            describes: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            transient: Mutex::new(VecDeque::new()),
            chunk_fault: None,
            stale_tokens: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            pages: Vec::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bulk(mut self) -> Self {
        self.bulk = true;
        self
    }

    /// Errors returned by the next submit calls, before any real work
    pub fn with_transient_failures(self, errors: impl IntoIterator<Item = SyncError>) -> Self {
        self.transient.lock().extend(errors);
        self
    }

    /// Fail every chunk for which `fault` returns an error
    pub fn with_chunk_fault<F>(mut self, fault: F) -> Self
    where
        F: Fn(&Chunk) -> Option<SyncError> + Send + Sync + 'static,
    {
        self.chunk_fault = Some(Box::new(fault));
        self
    }

    /// Query pages; page `n` links to `page-{n+1}` unless it is the last one
    pub fn with_pages(mut self, pages: Vec<Vec<WireRecord>>) -> Self {
        let count = pages.len();
        self.pages = pages
            .into_iter()
            .enumerate()
            .map(|(number, records)| {
                let last = number + 1 == count;
                QueryPage {
                    records,
                    total_size: 0,
                    done: last,
                    next_records_url: (!last).then(|| format!("page-{}", number + 1)),
                }
            })
            .collect();
        self
    }

    /// Reject requests carrying `access_token` as unauthorized
    pub fn expire_token(&self, access_token: &str) {
        self.stale_tokens.lock().push(access_token.to_string());
    }

    pub fn describe_calls(&self) -> usize {
        self.describes.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Chunk> {
        self.submitted.lock().clone()
    }

    /// Names of every record accepted by the store, in submission order
    pub fn submitted_names(&self) -> Vec<String> {
        self.submitted
            .lock()
            .iter()
            .flat_map(|chunk| chunk.records.iter())
            .filter_map(|record| record.get("Name").and_then(Json::as_str).map(str::to_string))
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    fn authorize(&self, token: &TokenSet) -> Result<()> {
        if self.stale_tokens.lock().contains(&token.access_token) {
            return Err(SyncError::Unauthorized("Session expired or invalid".into()));
        }
        Ok(())
    }

    fn page(&self, number: usize) -> Result<QueryPage> {
        if self.pages.is_empty() && number == 0 {
            return Ok(QueryPage::last(Vec::new()));
        }
        self.pages.get(number).cloned().ok_or_else(|| SyncError::Remote {
            status: 400,
            message: format!("INVALID_QUERY_LOCATOR: page-{number}"),
        })
    }

    fn outcome(&self, offset: usize, record: &WireRecord, operation: Operation) -> RecordOutcome {
        if record.get("Name").and_then(Json::as_str) == Some(REJECTED_NAME) {
            return RecordOutcome::failed(
                offset,
                RecordError::new("FIELD_CUSTOM_VALIDATION_EXCEPTION", "rejected by trigger")
                    .with_fields(vec!["Name".to_string()]),
            );
        }
        let id = match (operation, record.get("Id").and_then(Json::as_str)) {
            (Operation::Create, _) | (_, None) => {
                format!("001{:015}", self.next_id.fetch_add(1, Ordering::SeqCst))
            }
            (_, Some(id)) => id.to_string(),
        };
        RecordOutcome::succeeded(offset, Some(id))
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn describe(&self, token: &TokenSet, object_type: &str) -> Result<ObjectSchema> {
        self.authorize(token)?;
        self.describes.fetch_add(1, Ordering::SeqCst);
        if object_type == self.schema.object_type {
            Ok(self.schema.clone())
        } else {
            Err(SyncError::Remote { status: 404, message: format!("NOT_FOUND: {object_type}") })
        }
    }

    async fn query(&self, token: &TokenSet, soql: &str) -> Result<QueryPage> {
        self.authorize(token)?;
        self.queries.lock().push(soql.to_string());
        self.page(0)
    }

    async fn query_more(&self, token: &TokenSet, locator: &str) -> Result<QueryPage> {
        self.authorize(token)?;
        let number = locator
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| SyncError::Remote { status: 400, message: format!("bad locator {locator}") })?;
        self.page(number)
    }

    async fn submit(&self, token: &TokenSet, chunk: &Chunk) -> Result<Vec<RecordOutcome>> {
        self.authorize(token)?;
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.transient.lock().pop_front() {
            return Err(error);
        }
        if let Some(error) = self.chunk_fault.as_ref().and_then(|fault| fault(chunk)) {
            return Err(error);
        }

        self.submitted.lock().push(chunk.clone());
        Ok(chunk
            .records
            .iter()
            .enumerate()
            .map(|(offset, record)| self.outcome(offset, record, chunk.operation))
            .collect())
    }

    fn supports_bulk(&self) -> bool {
        self.bulk
    }
}
