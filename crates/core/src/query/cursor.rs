//! Lazy, restartable pagination over a query
//!
//! Nothing is fetched before the first [`QueryCursor::next`]. Each call maps
//! to exactly one server response; the page that carries no locator for a
//! successor is reported with `done = true`, and every call after that
//! returns an empty, done page.

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use sfsync_common::RetryPolicy;
use sfsync_domain::{ObjectSchema, QueryPage, Record, Result, SyncError};
use tracing::debug;

use crate::auth::CredentialSession;
use crate::sync::ports::ObjectStore;
use crate::transform::{decode_record, decode_untyped};

/// Records of one server response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub done: bool,
}

#[derive(Debug, Clone)]
enum CursorState {
    Fresh,
    Open { locator: String },
    Exhausted,
}

/// Forward-only cursor over a query's pages
pub struct QueryCursor {
    store: Arc<dyn ObjectStore>,
    session: Arc<CredentialSession>,
    soql: String,
    schema: Option<Arc<ObjectSchema>>,
    policy: RetryPolicy,
    state: CursorState,
    pages: u32,
}

impl QueryCursor {
    /// Prepare a cursor; no request is made yet
    pub fn open(store: Arc<dyn ObjectStore>, session: Arc<CredentialSession>, soql: impl Into<String>) -> Self {
        Self {
            store,
            session,
            soql: soql.into(),
            schema: None,
            policy: RetryPolicy::default(),
            state: CursorState::Fresh,
            pages: 0,
        }
    }

    /// Decode records against `schema` instead of generically
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<ObjectSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn soql(&self) -> &str {
        &self.soql
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }

    /// Start over from the first page
    pub fn restart(&mut self) {
        self.state = CursorState::Fresh;
        self.pages = 0;
    }

    /// Fetch the next page
    ///
    /// # Errors
    /// The transport error once the retry budget is spent, or a credential
    /// failure. The cursor position is unchanged on error.
    pub async fn next(&mut self) -> Result<Page> {
        let raw = match &self.state {
            CursorState::Exhausted => return Ok(Page { records: Vec::new(), done: true }),
            CursorState::Fresh => self.fetch(None).await?,
            CursorState::Open { locator } => self.fetch(Some(locator)).await?,
        };

        self.pages += 1;
        self.state = match raw.next_records_url {
            Some(locator) if !raw.done => CursorState::Open { locator },
            _ => CursorState::Exhausted,
        };
        let done = self.is_exhausted();
        debug!(page = self.pages, records = raw.records.len(), total_size = raw.total_size, done, "query page");

        let records = raw
            .records
            .iter()
            .map(|wire| match &self.schema {
                Some(schema) => decode_record(schema, wire),
                None => decode_untyped(wire),
            })
            .collect();
        Ok(Page { records, done })
    }

    /// All remaining records, or at most `limit`
    ///
    /// Page fetches stop as soon as `limit` records are in hand.
    ///
    /// # Errors
    /// Same as [`QueryCursor::next`].
    pub async fn collect(&mut self, limit: Option<usize>) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while !self.is_exhausted() && limit.map_or(true, |limit| records.len() < limit) {
            records.extend(self.next().await?.records);
        }
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    /// Lazy stream of the remaining records in server order
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        stream::try_unfold(self, |mut cursor| async move {
            if cursor.is_exhausted() {
                return Ok::<_, SyncError>(None);
            }
            let page = cursor.next().await?;
            Ok(Some((stream::iter(page.records.into_iter().map(Ok)), cursor)))
        })
        .try_flatten()
    }

    async fn fetch(&self, locator: Option<&str>) -> Result<QueryPage> {
        let store = &self.store;
        let soql = self.soql.as_str();
        let session = self.session.as_ref();
        self.policy
            .run("query_page", |_| async move {
                session
                    .with_token(|token| async move {
                        match locator {
                            Some(locator) => store.query_more(&token, locator).await,
                            None => store.query(&token, soql).await,
                        }
                    })
                    .await
            })
            .await
    }
}
