//! Schema discovery and caching

pub mod registry;

pub use registry::SchemaRegistry;
