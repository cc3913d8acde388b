//! Shared test helpers for `sfsync-core` integration tests.
//!
//! In-memory fakes of the object-store and token-endpoint ports plus a small
//! account schema, so engine tests can focus on behaviour instead of wiring.

#![allow(dead_code)]

pub mod endpoint;
pub mod fixtures;
pub mod store;

pub use endpoint::ScriptedEndpoint;
pub use fixtures::*;
pub use store::FakeStore;
