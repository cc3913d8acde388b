//! Chunked batch submission
//!
//! A job is encoded once, split into contiguous chunks and submitted serially.
//! A record whose value cannot be encoded fails on its own and is not sent.
//! Transport failures are retried per chunk through the [`RetryPolicy`]; an
//! unauthorized response goes through the credential session, which renews
//! and retries exactly once. Whatever happens to a chunk, every input record
//! ends up with exactly one outcome.

use std::sync::Arc;

use sfsync_common::RetryPolicy;
use sfsync_domain::constants::ID_FIELD;
use sfsync_domain::{
    BatchJob, BatchResult, Chunk, Operation, RecordError, RecordOutcome, Result, SubmitPath,
    SyncError, WireRecord,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::CredentialSession;
use crate::schema::SchemaRegistry;
use crate::sync::ports::{ObjectStore, ProgressObserver};
use crate::transform::encode_record;

/// Submits batch jobs to an [`ObjectStore`]
pub struct BatchExecutor {
    store: Arc<dyn ObjectStore>,
    registry: Arc<SchemaRegistry>,
    policy: RetryPolicy,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl BatchExecutor {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry, policy: RetryPolicy::default(), observer: None }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Receive cumulative progress after every chunk
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Submit every record of `job`
    ///
    /// # Errors
    /// Only structural problems surface as errors: `InvalidJob`,
    /// `SchemaDiscovery` and `UnmappedField`. Values that cannot be encoded,
    /// transport and remote failures are reported per record in the
    /// [`BatchResult`].
    pub async fn execute(&self, job: &BatchJob, session: &CredentialSession) -> Result<BatchResult> {
        self.execute_with_cancel(job, session, &CancellationToken::new()).await
    }

    /// [`BatchExecutor::execute`], checking `cancel` before every chunk
    ///
    /// Records of chunks not yet submitted when `cancel` fires fail with a
    /// `cancelled` error.
    ///
    /// # Errors
    /// Same as [`BatchExecutor::execute`].
    #[instrument(
        skip(self, job, session, cancel),
        fields(job_id = %job.id, object_type = %job.object_type, operation = %job.operation, total = job.total())
    )]
    pub async fn execute_with_cancel(
        &self,
        job: &BatchJob,
        session: &CredentialSession,
        cancel: &CancellationToken,
    ) -> Result<BatchResult> {
        let positions: Vec<usize> = (0..job.total()).collect();
        let outcomes = self.run(job, &positions, session, cancel).await?;
        Ok(BatchResult::from_outcomes(outcomes))
    }

    /// Resubmit the records that failed in `previous`
    ///
    /// The returned result is indexed against `job`; records that already
    /// succeeded keep their outcome and are never sent again.
    ///
    /// # Errors
    /// `InvalidJob` when `previous` does not describe `job`, plus everything
    /// [`BatchExecutor::execute`] raises.
    #[instrument(skip(self, job, previous, session), fields(job_id = %job.id, failed = previous.failed))]
    pub async fn retry_failed(
        &self,
        job: &BatchJob,
        previous: &BatchResult,
        session: &CredentialSession,
    ) -> Result<BatchResult> {
        let mut merged = previous.outcomes.clone();
        merged.sort_by_key(|outcome| outcome.index);
        let aligned = merged.len() == job.total()
            && merged.iter().enumerate().all(|(position, outcome)| outcome.index == position);
        if !aligned {
            return Err(SyncError::InvalidJob(format!(
                "previous result covers {} records, job {} has {}",
                previous.outcomes.len(),
                job.id,
                job.total()
            )));
        }

        let failed = previous.failed_indices();
        if failed.is_empty() {
            return Ok(BatchResult::from_outcomes(merged));
        }

        for outcome in self.run(job, &failed, session, &CancellationToken::new()).await? {
            let index = outcome.index;
            if let Some(slot) = merged.get_mut(index) {
                *slot = outcome;
            }
        }
        Ok(BatchResult::from_outcomes(merged))
    }

    /// Submit the records at `positions`; outcomes carry the original index
    async fn run(
        &self,
        job: &BatchJob,
        positions: &[usize],
        session: &CredentialSession,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecordOutcome>> {
        self.check_structure(job, positions)?;

        let schema = self.registry.discover(session, &job.object_type, false).await?;
        let total = positions.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut sendable = Vec::with_capacity(total);
        let mut wire: Vec<WireRecord> = Vec::with_capacity(total);
        for &position in positions {
            match encode_record(&schema, &job.records[position]) {
                Ok(encoded) => {
                    sendable.push(position);
                    wire.push(encoded);
                }
                // a bad value fails its own record only
                Err(err @ SyncError::InvalidValue { .. }) => {
                    warn!(index = position, error = %err, "record cannot be encoded");
                    outcomes.push(RecordOutcome::failed(position, RecordError::from(&err)));
                }
                Err(err) => return Err(err),
            }
        }

        info!(records = total, chunk_size = job.chunk_size, path = %job.path, "batch job started");

        let mut processed = outcomes.len();
        let mut sent = 0;
        for (number, (indices, records)) in
            sendable.chunks(job.chunk_size).zip(wire.chunks(job.chunk_size)).enumerate()
        {
            if cancel.is_cancelled() {
                warn!(chunk = number, remaining = total - processed, "batch job cancelled");
                let cancelled = RecordError::from(&SyncError::Cancelled);
                outcomes.extend(
                    sendable[sent..]
                        .iter()
                        .map(|&index| RecordOutcome::failed(index, cancelled.clone())),
                );
                break;
            }

            let chunk = Chunk {
                object_type: job.object_type.clone(),
                operation: job.operation,
                records: records.to_vec(),
                external_id_field: job.external_id_field.clone(),
                all_or_none: job.all_or_none,
            };

            match self.submit_chunk(&chunk, session).await {
                Ok(results) => {
                    outcomes.extend(results.into_iter().map(|outcome| {
                        let index = indices[outcome.index];
                        outcome.at(index)
                    }));
                }
                Err(err) => {
                    error!(chunk = number, records = indices.len(), error = %err, "chunk failed");
                    let failure = RecordError::from(&err);
                    outcomes.extend(indices.iter().map(|&index| RecordOutcome::failed(index, failure.clone())));
                }
            }

            sent += indices.len();
            processed += indices.len();
            if let Some(observer) = &self.observer {
                observer.on_progress(processed, total);
            }
        }
        outcomes.sort_by_key(|outcome| outcome.index);

        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        info!(succeeded, failed = outcomes.len() - succeeded, "batch job finished");
        Ok(outcomes)
    }

    /// One chunk through the retry policy and the session
    ///
    /// Outcomes come back sorted and indexed `0..chunk.records.len()`.
    async fn submit_chunk(&self, chunk: &Chunk, session: &CredentialSession) -> Result<Vec<RecordOutcome>> {
        let store = &self.store;
        let mut results = self
            .policy
            .run("submit_chunk", |attempt| async move {
                debug!(attempt, records = chunk.records.len(), "submitting chunk");
                session.with_token(|token| async move { store.submit(&token, chunk).await }).await
            })
            .await?;

        results.sort_by_key(|outcome| outcome.index);
        let complete = results.len() == chunk.records.len()
            && results.iter().enumerate().all(|(offset, outcome)| outcome.index == offset);
        if !complete {
            return Err(SyncError::Internal(format!(
                "store returned {} outcomes for a chunk of {}",
                results.len(),
                chunk.records.len()
            )));
        }
        Ok(results)
    }

    fn check_structure(&self, job: &BatchJob, positions: &[usize]) -> Result<()> {
        let limit = job.path.max_chunk_size();
        if job.chunk_size == 0 || job.chunk_size > limit {
            return Err(SyncError::InvalidJob(format!(
                "chunk size {} is outside 1..={limit} for the {} path",
                job.chunk_size, job.path
            )));
        }
        if job.path == SubmitPath::Bulk && !self.store.supports_bulk() {
            return Err(SyncError::InvalidJob("the object store does not support the bulk path".into()));
        }

        let external_id = match (job.operation, job.external_id_field.as_deref()) {
            (Operation::Upsert, None) => {
                return Err(SyncError::InvalidJob("upsert requires an external id field".into()));
            }
            (Operation::Upsert, Some(field)) => Some(field),
            _ => None,
        };

        for &position in positions {
            let record = job.records.get(position).ok_or_else(|| {
                SyncError::InvalidJob(format!("record {position} is outside the job"))
            })?;
            match job.operation {
                Operation::Update | Operation::Delete if !record.is_set(ID_FIELD) => {
                    return Err(SyncError::InvalidJob(format!(
                        "record {position} has no {ID_FIELD} for {}",
                        job.operation
                    )));
                }
                Operation::Upsert => {
                    if let Some(field) = external_id.filter(|field| !record.is_set(field)) {
                        return Err(SyncError::InvalidJob(format!(
                            "record {position} has no value for external id {field}"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
