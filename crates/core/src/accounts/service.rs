//! Account service
//!
//! Single-record account operations on top of [`SyncPipeline`] and
//! [`QueryCursor`]. In dry-run mode nothing is written: payloads are logged
//! and the would-be result is returned. Lookups still read from the store.

use std::sync::Arc;

use sfsync_domain::constants::{
    ACCOUNT_LIST_FIELDS, ACCOUNT_NAME_FIELD, ACCOUNT_OBJECT, DRY_RUN_ID, ID_FIELD, LIST_LIMIT_THRESHOLD,
};
use sfsync_domain::{BatchJob, Operation, Record, Result, SyncError};
use tracing::{info, instrument};

use crate::query::QueryCursor;
use crate::sync::ports::ObjectStore;
use crate::sync::SyncPipeline;
use crate::utils::soql::{escape_literal, is_field_path};

/// How an update finds its account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    Id(String),
    /// Must match exactly one account
    Lookup { field: String, value: String },
}

pub struct AccountService {
    pipeline: Arc<SyncPipeline>,
    store: Arc<dyn ObjectStore>,
    dry_run: bool,
}

impl AccountService {
    #[must_use]
    pub fn new(pipeline: Arc<SyncPipeline>, store: Arc<dyn ObjectStore>) -> Self {
        Self { pipeline, store, dry_run: false }
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Create an account and return its id ([`DRY_RUN_ID`] in dry-run mode)
    ///
    /// # Errors
    /// `InvalidValue` without a name, `Rejected` when validation or the store
    /// refuses the record.
    #[instrument(skip(self, account))]
    pub async fn create(&self, account: Record) -> Result<String> {
        if !account.is_set(ACCOUNT_NAME_FIELD) {
            return Err(SyncError::InvalidValue {
                field: ACCOUNT_NAME_FIELD.to_string(),
                message: "an account name is required".to_string(),
            });
        }
        info!(name = account.text(ACCOUNT_NAME_FIELD).unwrap_or_default(), "creating account");

        if self.dry_run {
            info!(payload = ?account, "dry run: account not created");
            return Ok(DRY_RUN_ID.to_string());
        }

        let id = self.submit_one(Operation::Create, account).await?;
        info!(id = %id, "account created");
        Ok(id)
    }

    /// Apply `changes` to one account and return its id
    ///
    /// # Errors
    /// `InvalidJob` for an empty payload, `NotFound` / `AmbiguousMatch` when
    /// a lookup does not match exactly one account, `Rejected` when the store
    /// refuses the update.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, target: AccountRef, changes: Record) -> Result<String> {
        if changes.is_empty() {
            return Err(SyncError::InvalidJob("no fields to update".to_string()));
        }

        let id = match target {
            AccountRef::Id(id) => id,
            AccountRef::Lookup { field, value } => self.resolve(&field, &value).await?,
        };
        info!(id = %id, fields = changes.len(), "updating account");

        if self.dry_run {
            info!(payload = ?changes, "dry run: account not updated");
            return Ok(id);
        }

        let mut record = changes;
        record.insert(ID_FIELD, id.as_str());
        self.submit_one(Operation::Update, record).await?;
        info!(id = %id, "account updated");
        Ok(id)
    }

    /// Newest accounts first; `limit == 0` returns every account
    ///
    /// # Errors
    /// Transport or credential failures of the underlying query.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: Option<&str>, limit: usize) -> Result<Vec<Record>> {
        let soql = list_query(filter, limit);
        info!(soql = %soql, "listing accounts");

        let mut cursor = self.cursor(soql);
        let records = cursor.collect((limit > 0).then_some(limit)).await?;
        info!(count = records.len(), "accounts retrieved");
        Ok(records)
    }

    /// Accounts whose `field` equals `value` exactly
    ///
    /// # Errors
    /// `InvalidValue` when `field` is not a field name.
    pub async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<Record>> {
        if !is_field_path(field) {
            return Err(SyncError::InvalidValue {
                field: field.to_string(),
                message: "not a field name".to_string(),
            });
        }
        let soql = format!(
            "SELECT {ID_FIELD}, {ACCOUNT_NAME_FIELD} FROM {ACCOUNT_OBJECT} WHERE {field} = '{}'",
            escape_literal(value)
        );
        self.cursor(soql).collect(None).await
    }

    async fn resolve(&self, field: &str, value: &str) -> Result<String> {
        let matches = self.find_by_field(field, value).await?;
        match matches.as_slice() {
            [] => Err(SyncError::NotFound(format!("no account with {field} = {value}"))),
            [account] => account
                .id()
                .map(str::to_string)
                .ok_or_else(|| SyncError::Internal("lookup result carries no Id".to_string())),
            _ => Err(SyncError::AmbiguousMatch {
                field: field.to_string(),
                value: value.to_string(),
                matches: matches.len(),
            }),
        }
    }

    async fn submit_one(&self, operation: Operation, record: Record) -> Result<String> {
        let job = BatchJob::new(ACCOUNT_OBJECT, operation, vec![record]);
        let result = self.pipeline.run(&job).await?;
        let outcome = result
            .outcomes
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Internal("batch returned no outcome".to_string()))?;

        match (outcome.success, outcome.error) {
            (true, _) => Ok(outcome.record_id.unwrap_or_default()),
            (false, Some(error)) => Err(SyncError::Rejected { code: error.code, message: error.message }),
            (false, None) => Err(SyncError::Internal("failed outcome without an error".to_string())),
        }
    }

    fn cursor(&self, soql: String) -> QueryCursor {
        let mut cursor = QueryCursor::open(self.store.clone(), self.pipeline.session().clone(), soql);
        if let Some(schema) = self.pipeline.registry().cached(ACCOUNT_OBJECT) {
            cursor = cursor.with_schema(schema);
        }
        cursor
    }
}

/// Listing query: fixed projection, optional filter, newest first
///
/// Up to [`LIST_LIMIT_THRESHOLD`] rows the server applies the limit; above
/// it, or with `limit == 0`, the result is paginated and truncated locally.
pub fn list_query(filter: Option<&str>, limit: usize) -> String {
    let mut soql = format!("SELECT {} FROM {ACCOUNT_OBJECT}", ACCOUNT_LIST_FIELDS.join(", "));
    if let Some(filter) = filter.map(str::trim).filter(|filter| !filter.is_empty()) {
        soql.push_str(" WHERE ");
        soql.push_str(filter);
    }
    soql.push_str(" ORDER BY CreatedDate DESC");
    if limit > 0 && limit <= LIST_LIMIT_THRESHOLD {
        soql.push_str(&format!(" LIMIT {limit}"));
    }
    soql
}
