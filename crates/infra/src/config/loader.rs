//! Configuration loader
//!
//! Builds the application configuration from an optional file and the
//! process environment.
//!
//! ## Loading Strategy
//! 1. Read the config file: the explicit path, or the first candidate found
//! 2. Fill every connection key the file left unset from `SF_*` variables
//! 3. Apply defaults to what is still unset
//! 4. Fail with one error naming every missing required key
//!
//! ## Environment Variables
//! - `SF_USERNAME`, `SF_PASSWORD`, `SF_SECURITY_TOKEN`: credentials (required)
//! - `SF_DOMAIN`: login host prefix, `login` or `test`
//! - `SF_CONSUMER_KEY`, `SF_CONSUMER_SECRET`: connected app credentials
//! - `SF_API_VERSION`: REST API version, e.g. `59.0`
//!
//! ## File Locations
//! Without an explicit path the loader looks, in the working directory, for
//! `sfsync.toml`, `sfsync.json`, `config.toml`, `config.json`. Finding none is
//! not an error; the environment alone may be enough.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sfsync_domain::{Config, Result, SalesforceConfig, SyncConfig, SyncError};

const CANDIDATE_FILES: [&str; 4] = ["sfsync.toml", "sfsync.json", "config.toml", "config.json"];

/// File shape; every connection key is optional so unset keys can be told
/// apart from defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    salesforce: FileSalesforce,
    sync: SyncConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSalesforce {
    username: Option<String>,
    password: Option<String>,
    security_token: Option<String>,
    domain: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    api_version: Option<String>,
    session_ttl_secs: Option<u64>,
}

/// Load configuration from a file and the environment
///
/// # Errors
/// Returns `SyncError::Config` if:
/// - `path` is given but does not exist
/// - the file cannot be read or parsed
/// - required keys are missing from both the file and the environment
pub fn load(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", path.display())));
            }
            load_file(path)?
        }
        None => match find_config_file() {
            Some(found) => load_file(&found)?,
            None => {
                tracing::debug!("no config file found, using the environment only");
                FileConfig::default()
            }
        },
    };

    resolve(file, |key| std::env::var(key).ok())
}

/// Load configuration from `SF_*` environment variables alone
///
/// # Errors
/// Returns `SyncError::Config` naming every missing required variable.
pub fn load_from_env() -> Result<Config> {
    resolve(FileConfig::default(), |key| std::env::var(key).ok())
}

/// First existing candidate in the working directory
pub fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    CANDIDATE_FILES.iter().map(|name| cwd.join(name)).find(|candidate| candidate.is_file())
}

fn load_file(path: &Path) -> Result<FileConfig> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    parse_config(&contents, path)
}

/// Format is detected by file extension (`.json` or `.toml`)
fn parse_config(contents: &str, path: &Path) -> Result<FileConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| SyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => {
            serde_json::from_str(contents).map_err(|e| SyncError::Config(format!("Invalid JSON format: {}", e)))
        }
        _ => Err(SyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Merge file values over the environment over defaults, then check the
/// required keys
fn resolve<E>(file: FileConfig, env: E) -> Result<Config>
where
    E: Fn(&str) -> Option<String>,
{
    let pick = |from_file: Option<String>, key: &str| {
        from_file.filter(|value| !value.trim().is_empty()).or_else(|| {
            env(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        })
    };

    let defaults = SalesforceConfig::default();
    let source = file.salesforce;
    let salesforce = SalesforceConfig {
        username: pick(source.username, "SF_USERNAME").unwrap_or_default(),
        password: pick(source.password, "SF_PASSWORD").unwrap_or_default(),
        security_token: pick(source.security_token, "SF_SECURITY_TOKEN").unwrap_or_default(),
        domain: pick(source.domain, "SF_DOMAIN").unwrap_or(defaults.domain),
        consumer_key: pick(source.consumer_key, "SF_CONSUMER_KEY"),
        consumer_secret: pick(source.consumer_secret, "SF_CONSUMER_SECRET"),
        api_version: pick(source.api_version, "SF_API_VERSION").unwrap_or(defaults.api_version),
        session_ttl_secs: source.session_ttl_secs,
    };

    let missing = salesforce.missing_required_keys();
    if !missing.is_empty() {
        return Err(SyncError::Config(format!(
            "Missing required configuration keys: {} (set them in the config file or as SF_* environment variables)",
            missing.join(", ")
        )));
    }

    let config = Config { salesforce, sync: file.sync };
    tracing::debug!(config = ?config, "configuration resolved");
    Ok(config)
}
