//! End-to-end synchronization: ports and the validate-then-submit pipeline

pub mod pipeline;
pub mod ports;

pub use pipeline::SyncPipeline;
pub use ports::{ObjectStore, ProgressObserver};
