//! Batch execution: chunking, submission and per-record outcomes

pub mod executor;

pub use executor::BatchExecutor;
