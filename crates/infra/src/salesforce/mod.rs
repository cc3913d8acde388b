//! Salesforce REST integration
//!
//! Implements the core ports against the Salesforce platform:
//! - [`SalesforceClient`]: describe, SOQL query and sObject collections
//!   behind `ObjectStore`
//! - [`OAuthTokenClient`]: the OAuth 2.0 token endpoint behind
//!   `TokenEndpoint`

pub mod client;
mod describe;
pub mod oauth;
mod types;

pub use client::SalesforceClient;
pub use oauth::OAuthTokenClient;
