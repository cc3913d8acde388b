//! # sfsync Domain
//!
//! Business domain types and models for sfsync.
//!
//! This crate contains:
//! - Field metadata, records and values
//! - Batch jobs, chunks and per-record outcomes
//! - Credential types
//! - `SyncError` and the `Result` alias
//! - Configuration structures and constants
//!
//! ## Architecture
//! - Depends only on the foundation tier of `sfsync-common`
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
