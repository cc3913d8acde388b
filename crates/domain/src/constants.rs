//! Domain constants
//!
//! Centralized location for the API limits, wire formats and account
//! defaults shared by the engine, the adapters and the CLI.

// API limits
pub const SYNC_CHUNK_LIMIT: usize = 200;
pub const BULK_CHUNK_LIMIT: usize = 10_000;
pub const DEFAULT_API_VERSION: &str = "59.0";
pub const DEFAULT_LOGIN_DOMAIN: &str = "login";

// Wire formats
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
pub const MULTI_SELECT_SEPARATOR: char = ';';
pub const ATTRIBUTES_KEY: &str = "attributes";
pub const ID_FIELD: &str = "Id";

// Account operations
pub const ACCOUNT_OBJECT: &str = "Account";
pub const ACCOUNT_NAME_FIELD: &str = "Name";
pub const ACCOUNT_LIST_FIELDS: [&str; 10] = [
    "Id",
    "Name",
    "Type",
    "Industry",
    "Phone",
    "Website",
    "Domain__c",
    "BillingCity",
    "BillingState",
    "CreatedDate",
];
/// Above this many rows a listing paginates instead of using `LIMIT`
pub const LIST_LIMIT_THRESHOLD: usize = 2000;
pub const DRY_RUN_ID: &str = "dry_run_id";
