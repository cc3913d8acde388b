//! `create`, `update` and `list`

use std::io::Write;

use anyhow::{bail, Context};
use sfsync_core::AccountRef;
use sfsync_infra::export_accounts;

use crate::cli::{CreateArgs, ListArgs, UpdateArgs};
use crate::context::AppContext;
use crate::output::account_table;

const LOOKUP_FIELD: &str = "AccountNumber";

pub async fn create(ctx: &AppContext, args: CreateArgs, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let id = ctx.accounts.create(args.into_record()).await.context("Failed to create account")?;

    if ctx.dry_run {
        writeln!(out, "Dry run completed successfully")?;
    } else {
        writeln!(out, "Created account with ID: {id}")?;
    }
    Ok(())
}

pub async fn update(ctx: &AppContext, args: UpdateArgs, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let changes = args.changes();
    if changes.is_empty() {
        bail!("No fields to update specified");
    }

    let target = match (args.target.id, args.target.account_number) {
        (Some(id), _) => AccountRef::Id(id),
        (None, Some(number)) => AccountRef::Lookup { field: LOOKUP_FIELD.to_string(), value: number },
        (None, None) => bail!("either --id or --account-number is required"),
    };

    let id = ctx.accounts.update(target, changes).await.context("Failed to update account")?;

    if ctx.dry_run {
        writeln!(out, "Dry run completed successfully")?;
    } else {
        writeln!(out, "Account {id} updated successfully")?;
    }
    Ok(())
}

pub async fn list(ctx: &AppContext, args: ListArgs, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let accounts =
        ctx.accounts.list(args.filter.as_deref(), args.limit).await.context("Failed to retrieve accounts")?;

    if let Some(path) = &args.output_file {
        let written = export_accounts(path, &accounts)
            .with_context(|| format!("Failed to write accounts to {}", path.display()))?;
        writeln!(out, "Successfully wrote {written} accounts to {}", path.display())?;
    } else if accounts.is_empty() {
        writeln!(out, "No accounts found")?;
    } else {
        write!(out, "{}", account_table(&accounts))?;
    }
    Ok(())
}
