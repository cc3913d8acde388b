//! Batch jobs, chunks and per-record outcomes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{Record, WireRecord};
use crate::constants::{BULK_CHUNK_LIMIT, SYNC_CHUNK_LIMIT};
use crate::errors::SyncError;
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Upsert,
    Delete,
}

impl_domain_status_conversions!(Operation {
    Create => "create",
    Update => "update",
    Upsert => "upsert",
    Delete => "delete",
});

impl Operation {
    /// Update payloads are validated partially
    pub fn is_partial(self) -> bool {
        matches!(self, Self::Update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPath {
    #[default]
    Synchronous,
    Bulk,
}

impl_domain_status_conversions!(SubmitPath {
    Synchronous => "synchronous",
    Bulk => "bulk",
});

impl SubmitPath {
    pub fn max_chunk_size(self) -> usize {
        match self {
            Self::Synchronous => SYNC_CHUNK_LIMIT,
            Self::Bulk => BULK_CHUNK_LIMIT,
        }
    }
}

/// A record set to push with one operation
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: Uuid,
    pub object_type: String,
    pub operation: Operation,
    pub records: Vec<Record>,
    pub chunk_size: usize,
    pub path: SubmitPath,
    /// Required for upsert
    pub external_id_field: Option<String>,
    pub all_or_none: bool,
}

impl BatchJob {
    pub fn new(object_type: impl Into<String>, operation: Operation, records: Vec<Record>) -> Self {
        Self {
            id: Uuid::new_v4(),
            object_type: object_type.into(),
            operation,
            records,
            chunk_size: SYNC_CHUNK_LIMIT,
            path: SubmitPath::Synchronous,
            external_id_field: None,
            all_or_none: false,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_path(mut self, path: SubmitPath) -> Self {
        self.path = path;
        self
    }

    pub fn with_external_id(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = Some(field.into());
        self
    }

    pub fn with_all_or_none(mut self, all_or_none: bool) -> Self {
        self.all_or_none = all_or_none;
        self
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// One network call's worth of wire records
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub object_type: String,
    pub operation: Operation,
    pub records: Vec<WireRecord>,
    pub external_id_field: Option<String>,
    pub all_or_none: bool,
}

/// Failure attached to a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    /// Remote status code (`REQUIRED_FIELD_MISSING`) or an engine error code
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl RecordError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), fields: Vec::new() }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

impl From<&SyncError> for RecordError {
    fn from(err: &SyncError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of one input record, indexed against the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub index: usize,
    pub success: bool,
    pub record_id: Option<String>,
    pub error: Option<RecordError>,
}

impl RecordOutcome {
    pub fn succeeded(index: usize, record_id: Option<String>) -> Self {
        Self { index, success: true, record_id, error: None }
    }

    pub fn failed(index: usize, error: RecordError) -> Self {
        Self { index, success: false, record_id: None, error: Some(error) }
    }

    /// Same outcome re-indexed against another job
    pub fn at(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

/// Aggregated per-record outcomes in input order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    /// Counts are derived from the outcomes
    pub fn from_outcomes(outcomes: Vec<RecordOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        Self { total: outcomes.len(), succeeded, failed: outcomes.len() - succeeded, outcomes }
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes.iter().filter(|outcome| !outcome.success).map(|outcome| outcome.index).collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}
