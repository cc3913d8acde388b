//! # sfsync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The reqwest HTTP client and error conversions
//! - The Salesforce REST adapter (`ObjectStore`) and OAuth token client
//!   (`TokenEndpoint`)
//! - Configuration loading (file + environment)
//! - Pipe-delimited account export
//!
//! ## Architecture
//! - Implements traits defined in `sfsync-core`
//! - Depends on `sfsync-domain` and `sfsync-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod config;
pub mod errors;
pub mod export;
pub mod http;
pub mod salesforce;

// Re-export commonly used items
pub use errors::InfraError;
pub use export::{export_accounts, format_line, write_accounts};
pub use http::{HttpClient, HttpClientBuilder};
pub use salesforce::{OAuthTokenClient, SalesforceClient};
