//! # sfsync Core
//!
//! Validation and synchronization engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the object store and the token endpoint (traits)
//! - Schema registry, validation engine and type transformer
//! - Credential session, batch executor and pagination cursor
//! - The sync pipeline and the account service built on top of them
//!
//! ## Architecture Principles
//! - Only depends on `sfsync-common` and `sfsync-domain`
//! - No HTTP or filesystem code
//! - All external collaborators via traits
//! - Pure, testable business logic

pub mod accounts;
pub mod auth;
pub mod batch;
pub mod query;
pub mod schema;
pub mod sync;
pub mod transform;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export the engine surface
pub use accounts::{AccountRef, AccountService};
pub use auth::{CredentialSession, TokenEndpoint};
pub use batch::BatchExecutor;
pub use query::{Page, QueryCursor};
pub use schema::SchemaRegistry;
pub use sync::{ObjectStore, ProgressObserver, SyncPipeline};
pub use transform::TypeTransformer;
pub use validation::{BusinessRule, FnRule, RuleFault, SentinelClassificationRule, ValidationEngine};
