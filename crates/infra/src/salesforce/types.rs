//! Wire payloads of the Salesforce REST API

use serde::{Deserialize, Serialize};
use sfsync_domain::{QueryPage, RecordError, RecordOutcome, WireRecord};

/// `GET sobjects/{type}/describe`
#[derive(Debug, Deserialize)]
pub(crate) struct DescribeResponse {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DescribeField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub precision: u32,
    #[serde(default)]
    pub scale: u32,
    #[serde(default)]
    pub digits: u32,
    #[serde(default)]
    pub createable: bool,
    #[serde(default = "default_true")]
    pub nillable: bool,
    #[serde(default)]
    pub defaulted_on_create: bool,
    #[serde(default)]
    pub picklist_values: Vec<PicklistEntry>,
    #[serde(default)]
    pub reference_to: Vec<String>,
    #[serde(default)]
    pub relationship_name: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct PicklistEntry {
    pub value: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// `GET query` and `GET {nextRecordsUrl}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub next_records_url: Option<String>,
    #[serde(default)]
    pub records: Vec<WireRecord>,
}

impl From<QueryResponse> for QueryPage {
    fn from(response: QueryResponse) -> Self {
        Self {
            records: response.records,
            total_size: response.total_size,
            done: response.done,
            next_records_url: response.next_records_url,
        }
    }
}

/// Body of the create, update and upsert collection calls
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionRequest {
    pub all_or_none: bool,
    pub records: Vec<WireRecord>,
}

/// One entry of a collection response, positional against the request
#[derive(Debug, Deserialize)]
pub(crate) struct SaveResult {
    #[serde(default)]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SaveError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveError {
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SaveResult {
    pub fn into_outcome(self, index: usize) -> RecordOutcome {
        if self.success {
            return RecordOutcome::succeeded(index, self.id);
        }

        let mut errors = self.errors.into_iter();
        let error = match errors.next() {
            Some(first) => {
                let mut message = first.message;
                let mut fields = first.fields;
                for extra in errors {
                    message.push_str("; ");
                    message.push_str(&extra.message);
                    fields.extend(extra.fields);
                }
                RecordError::new(first.status_code, message).with_fields(fields)
            }
            None => RecordError::new("UNKNOWN_EXCEPTION", "record failed without an error detail"),
        };
        RecordOutcome::failed(index, error)
    }
}
