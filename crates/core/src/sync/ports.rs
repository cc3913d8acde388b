//! Port interfaces for the remote object store

use async_trait::async_trait;
use sfsync_domain::{Chunk, ObjectSchema, QueryPage, RecordOutcome, Result, TokenSet};

/// Remote object store (describe, query, collection writes)
///
/// Every call takes the access credential explicitly. An expired or rejected
/// credential must surface as `SyncError::Unauthorized`, distinct from
/// transport failures, so the session can refresh and retry.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Field metadata of an object type, already mapped onto field kinds
    async fn describe(&self, token: &TokenSet, object_type: &str) -> Result<ObjectSchema>;

    /// First page of a query
    async fn query(&self, token: &TokenSet, soql: &str) -> Result<QueryPage>;

    /// Next page, addressed by the locator of the previous one
    async fn query_more(&self, token: &TokenSet, locator: &str) -> Result<QueryPage>;

    /// Submit one chunk; outcomes are indexed `0..chunk.records.len()`
    async fn submit(&self, token: &TokenSet, chunk: &Chunk) -> Result<Vec<RecordOutcome>>;

    /// Whether chunks above the synchronous limit are accepted
    fn supports_bulk(&self) -> bool {
        false
    }
}

/// Receives cumulative progress after every submitted chunk
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total);
    }
}
