//! # sfsync CLI
//!
//! Command-line front end for the sync engine.
//!
//! This crate contains:
//! - Argument parsing (`clap`)
//! - Application context (dependency injection)
//! - Command handlers and terminal rendering
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the infrastructure adapters into the core engine

pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
pub mod output;

use std::io::Write;
use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::warn;

pub use cli::{Cli, Command};
pub use context::AppContext;

/// Load configuration, connect and dispatch `cli.command`
///
/// # Errors
/// Configuration, authentication and command failures.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = sfsync_infra::config::load(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current chunk");
            on_interrupt.cancel();
        }
    });

    let ctx = AppContext::connect(config, cli.dry_run).await?;
    let mut stdout = std::io::stdout();
    let success = execute(&ctx, cli.command, &cancel, &mut stdout).await?;
    stdout.flush()?;

    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run one command against an established context
///
/// Returns `false` when the command completed but reported failed records.
///
/// # Errors
/// Whatever the command handler reports.
pub async fn execute(
    ctx: &AppContext,
    command: Command,
    cancel: &CancellationToken,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<bool> {
    match command {
        Command::Create(args) => commands::create(ctx, args, out).await.map(|()| true),
        Command::Update(args) => commands::update(ctx, args, out).await.map(|()| true),
        Command::List(args) => commands::list(ctx, args, out).await.map(|()| true),
        Command::Describe(args) => commands::describe(ctx, args, out).await.map(|()| true),
        Command::Sync(args) => commands::sync(ctx, args, cancel, out).await,
    }
}
