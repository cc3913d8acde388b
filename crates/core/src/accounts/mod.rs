//! Account operations: create, update, list and lookup

pub mod service;

pub use service::{list_query, AccountRef, AccountService};
