//! Schemas, records and wiring shared by the integration tests

use std::sync::Arc;
use std::time::Duration;

use sfsync_common::RetryPolicy;
use sfsync_core::{BatchExecutor, CredentialSession, SchemaRegistry, SyncPipeline, ValidationEngine};
use sfsync_domain::{FieldDefinition, FieldKind, Grant, ObjectSchema, Record};

use super::{FakeStore, ScriptedEndpoint};

pub fn account_schema() -> ObjectSchema {
    let fields = vec![
        FieldDefinition::new("Id", FieldKind::Reference),
        FieldDefinition::new("Name", FieldKind::Text).required().max_length(255),
        FieldDefinition::new("Type", FieldKind::Picklist).allowed_values(["Customer", "Partner", "Prospect"]),
        FieldDefinition::new("Phone", FieldKind::Text).max_length(40),
        FieldDefinition::new("AccountNumber", FieldKind::Text).max_length(40),
        FieldDefinition::new("External_Id__c", FieldKind::Text).max_length(64),
        FieldDefinition::new("Tags__c", FieldKind::MultiPicklist).allowed_values(["A", "B", "C"]),
        FieldDefinition::new("AnnualRevenue", FieldKind::Currency).digits(18, 2),
        FieldDefinition::new("ParentId", FieldKind::Reference).references("Account", Some("Parent")),
    ];
    match ObjectSchema::new("Account", fields) {
        Ok(schema) => schema,
        Err(err) => panic!("fixture schema is invalid: {err}"),
    }
}

pub fn named(name: &str) -> Record {
    Record::new().with("Name", name)
}

/// `count` valid accounts named `Account 0`, `Account 1`, ...
pub fn accounts(count: usize) -> Vec<Record> {
    (0..count).map(|n| named(&format!("Account {n}"))).collect()
}

pub fn password_grant() -> Grant {
    Grant::Password {
        username: "integration@example.com".into(),
        password: "secret".into(),
        security_token: "token".into(),
    }
}

/// Three attempts with millisecond backoff
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::exponential(3, Duration::from_millis(1), Duration::from_millis(4))
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub session: Arc<CredentialSession>,
    pub registry: Arc<SchemaRegistry>,
    pub executor: Arc<BatchExecutor>,
    pub pipeline: Arc<SyncPipeline>,
}

impl Harness {
    pub async fn new(store: FakeStore) -> Self {
        Self::with_executor(store, |executor| executor).await
    }

    pub async fn with_executor(store: FakeStore, configure: impl FnOnce(BatchExecutor) -> BatchExecutor) -> Self {
        let store = Arc::new(store);
        let endpoint = Arc::new(ScriptedEndpoint::new());
        let session = match CredentialSession::connect(endpoint.clone(), password_grant()).await {
            Ok(session) => Arc::new(session),
            Err(err) => panic!("authentication failed: {err}"),
        };
        let registry = Arc::new(SchemaRegistry::new(store.clone()));
        let executor =
            Arc::new(configure(BatchExecutor::new(store.clone(), registry.clone()).with_retry_policy(fast_retry())));
        let engine = Arc::new(ValidationEngine::new(registry.clone()));
        let pipeline = Arc::new(SyncPipeline::new(engine, executor.clone(), session.clone()));
        Self { store, endpoint, session, registry, executor, pipeline }
    }
}
