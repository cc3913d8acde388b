//! `describe`

use std::io::Write;

use anyhow::Context;

use crate::cli::DescribeArgs;
use crate::context::AppContext;
use crate::output::schema_table;

pub async fn describe(ctx: &AppContext, args: DescribeArgs, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let schema = ctx
        .pipeline
        .registry()
        .discover(&ctx.session, &args.object_type, false)
        .await
        .with_context(|| format!("Failed to describe {}", args.object_type))?;

    write!(out, "{}", schema_table(&schema))?;
    Ok(())
}
