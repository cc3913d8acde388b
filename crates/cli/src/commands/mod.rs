//! Command handlers
//!
//! Each handler writes its user-facing output to `out` and leaves logging to
//! `tracing`.

mod accounts;
mod describe;
mod sync;

pub use accounts::{create, list, update};
pub use describe::describe;
pub use sync::{sync, SyncFile};
