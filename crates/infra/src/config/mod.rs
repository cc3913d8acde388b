//! Configuration loading
//!
//! This module loads the application configuration from a TOML or JSON
//! file and `SF_*` environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{find_config_file, load, load_from_env};
