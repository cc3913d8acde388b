//! Discover, validate, transform and execute one job
//!
//! Records that fail validation never reach the store. They are reported at
//! their original index with a `validation` error next to the outcomes of the
//! records that were submitted.

use std::sync::Arc;

use sfsync_domain::{
    BatchJob, BatchResult, Operation, Record, RecordError, RecordOutcome, Result, ValidationResult,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::auth::CredentialSession;
use crate::batch::BatchExecutor;
use crate::schema::SchemaRegistry;
use crate::validation::ValidationEngine;

/// Error code of records rejected before submission
pub const VALIDATION_ERROR_CODE: &str = "validation";

pub struct SyncPipeline {
    registry: Arc<SchemaRegistry>,
    engine: Arc<ValidationEngine>,
    executor: Arc<BatchExecutor>,
    session: Arc<CredentialSession>,
}

impl SyncPipeline {
    #[must_use]
    pub fn new(
        engine: Arc<ValidationEngine>,
        executor: Arc<BatchExecutor>,
        session: Arc<CredentialSession>,
    ) -> Self {
        Self { registry: engine.registry().clone(), engine, executor, session }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Arc<CredentialSession> {
        &self.session
    }

    pub fn executor(&self) -> &Arc<BatchExecutor> {
        &self.executor
    }

    /// Validate one record, discovering its object type first if needed
    ///
    /// # Errors
    /// `SchemaDiscovery` or `UnknownField`.
    pub async fn validate(&self, object_type: &str, record: &Record, partial: bool) -> Result<ValidationResult> {
        self.registry.discover(&self.session, object_type, false).await?;
        self.engine.validate(object_type, record, partial)
    }

    /// Run `job` to completion
    ///
    /// # Errors
    /// Structural errors only; see [`BatchExecutor::execute`].
    pub async fn run(&self, job: &BatchJob) -> Result<BatchResult> {
        self.run_with_cancel(job, &CancellationToken::new()).await
    }

    /// # Errors
    /// Same as [`SyncPipeline::run`].
    #[instrument(skip(self, job, cancel), fields(job_id = %job.id, object_type = %job.object_type, total = job.total()))]
    pub async fn run_with_cancel(&self, job: &BatchJob, cancel: &CancellationToken) -> Result<BatchResult> {
        self.registry.discover(&self.session, &job.object_type, false).await?;

        let partial = job.operation.is_partial();
        let mut outcomes = Vec::with_capacity(job.total());
        let mut accepted = Vec::new();
        let mut positions = Vec::new();

        for (index, record) in job.records.iter().enumerate() {
            if job.operation != Operation::Delete {
                let result = self.engine.validate(&job.object_type, record, partial)?;
                if !result.ok {
                    outcomes.push(RecordOutcome::failed(index, rejection(&result)));
                    continue;
                }
            }
            accepted.push(record.clone());
            positions.push(index);
        }

        if !outcomes.is_empty() {
            warn!(rejected = outcomes.len(), "records failed validation");
        }

        if !accepted.is_empty() {
            let submitted = BatchJob {
                id: job.id,
                object_type: job.object_type.clone(),
                operation: job.operation,
                records: accepted,
                chunk_size: job.chunk_size,
                path: job.path,
                external_id_field: job.external_id_field.clone(),
                all_or_none: job.all_or_none,
            };
            let result = self.executor.execute_with_cancel(&submitted, &self.session, cancel).await?;
            outcomes.extend(result.outcomes.into_iter().map(|outcome| {
                let index = positions[outcome.index];
                outcome.at(index)
            }));
        }

        outcomes.sort_by_key(|outcome| outcome.index);
        let result = BatchResult::from_outcomes(outcomes);
        info!(succeeded = result.succeeded, failed = result.failed, "sync finished");
        Ok(result)
    }
}

fn rejection(result: &ValidationResult) -> RecordError {
    let mut fields: Vec<String> = Vec::new();
    for error in &result.errors {
        if !fields.contains(&error.field) {
            fields.push(error.field.clone());
        }
    }
    RecordError::new(VALIDATION_ERROR_CODE, result.summary()).with_fields(fields)
}
