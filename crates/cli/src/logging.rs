//! Console and file logging

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "sfsync.log";

/// `RUST_LOG` when set, otherwise `info` (`debug` with `--verbose`)
pub fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber: stderr plus `sfsync.log` in `directory`
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole process.
///
/// # Errors
/// When a global subscriber is already installed.
pub fn init(verbose: bool, directory: &Path) -> anyhow::Result<WorkerGuard> {
    let (file_writer, guard) = non_blocking(rolling::never(directory, LOG_FILE));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file = fmt::layer().with_writer(file_writer).with_ansi(false).with_target(true);

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install the log subscriber")?;

    Ok(guard)
}
