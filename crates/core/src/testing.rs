//! Fixtures shared by the unit tests of this crate

use async_trait::async_trait;
use sfsync_domain::{
    Chunk, FieldDefinition, FieldKind, ObjectSchema, QueryPage, RecordOutcome, Result, SyncError,
    TokenSet,
};

use crate::sync::ports::ObjectStore;

/// Account-shaped schema covering every field kind
pub(crate) fn account_schema() -> ObjectSchema {
    let fields = vec![
        FieldDefinition::new("Id", FieldKind::Reference).label("Account ID"),
        FieldDefinition::new("Name", FieldKind::Text).label("Account Name").required().max_length(255),
        FieldDefinition::new("Type", FieldKind::Picklist).allowed_values(["Customer", "Partner", "Prospect"]),
        FieldDefinition::new("Phone", FieldKind::Text).max_length(40),
        FieldDefinition::new("Website", FieldKind::Text).max_length(255),
        FieldDefinition::new("AnnualRevenue", FieldKind::Currency).digits(18, 2),
        FieldDefinition::new("NumberOfEmployees", FieldKind::Number).digits(8, 0),
        FieldDefinition::new("Tags__c", FieldKind::MultiPicklist).allowed_values(["A", "B", "C"]),
        FieldDefinition::new("Founded__c", FieldKind::Date),
        FieldDefinition::new("LastSynced__c", FieldKind::DateTime),
        FieldDefinition::new("Active__c", FieldKind::Boolean),
        FieldDefinition::new("ParentId", FieldKind::Reference).references("Account", Some("Parent")),
        FieldDefinition::new("Classification__c", FieldKind::Picklist)
            .allowed_values(["Standard", "Sentinel"]),
        FieldDefinition::new("Tracking_Number__c", FieldKind::Text).max_length(32),
        FieldDefinition::new("Linked_Transactions__c", FieldKind::MultiPicklist),
    ];
    match ObjectSchema::new("Account", fields) {
        Ok(schema) => schema,
        Err(err) => panic!("fixture schema is invalid: {err}"),
    }
}

/// Store that must never be reached
pub(crate) struct NullStore;

fn unreachable_store() -> SyncError {
    SyncError::Internal("unit tests do not reach the remote store".to_string())
}

#[async_trait]
impl ObjectStore for NullStore {
    async fn describe(&self, _token: &TokenSet, _object_type: &str) -> Result<ObjectSchema> {
        Err(unreachable_store())
    }

    async fn query(&self, _token: &TokenSet, _soql: &str) -> Result<QueryPage> {
        Err(unreachable_store())
    }

    async fn query_more(&self, _token: &TokenSet, _locator: &str) -> Result<QueryPage> {
        Err(unreachable_store())
    }

    async fn submit(&self, _token: &TokenSet, _chunk: &Chunk) -> Result<Vec<RecordOutcome>> {
        Err(unreachable_store())
    }
}
