//! Raw query pages returned by the remote store

use super::record::WireRecord;

/// One server response of a query or query-more call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub records: Vec<WireRecord>,
    /// Size of the full result set as reported by the server
    pub total_size: u64,
    /// True on the last page
    pub done: bool,
    /// Locator for the next page, absent on the last one
    pub next_records_url: Option<String>,
}

impl QueryPage {
    pub fn last(records: Vec<WireRecord>) -> Self {
        let total_size = records.len() as u64;
        Self { records, total_size, done: true, next_records_url: None }
    }
}
