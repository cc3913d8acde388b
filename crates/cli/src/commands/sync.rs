//! `sync`: push a JSON batch file through the pipeline

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use sfsync_core::transform::decode_record;
use sfsync_domain::{BatchJob, Operation, SubmitPath, WireRecord};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::context::AppContext;
use crate::output::batch_summary;

/// Layout of a batch file
#[derive(Debug, Deserialize)]
pub struct SyncFile {
    #[serde(default = "default_object_type")]
    pub object_type: String,
    pub operation: Operation,
    #[serde(default)]
    pub external_id_field: Option<String>,
    #[serde(default)]
    pub all_or_none: bool,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub path: SubmitPath,
    pub records: Vec<WireRecord>,
}

fn default_object_type() -> String {
    "Account".to_string()
}

impl SyncFile {
    /// # Errors
    /// When the file cannot be read or is not a batch document.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read batch file {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid batch file {}", path.display()))
    }
}

/// Returns `false` when any record failed (or, in a dry run, is invalid)
pub async fn sync(
    ctx: &AppContext,
    args: SyncArgs,
    cancel: &CancellationToken,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<bool> {
    let file = SyncFile::load(&args.file)?;
    let schema = ctx
        .pipeline
        .registry()
        .discover(&ctx.session, &file.object_type, false)
        .await
        .with_context(|| format!("Failed to describe {}", file.object_type))?;

    let records = file.records.iter().map(|wire| decode_record(&schema, wire)).collect();
    let mut job = BatchJob::new(&file.object_type, file.operation, records)
        .with_chunk_size(file.chunk_size.unwrap_or(ctx.config.sync.chunk_size))
        .with_path(file.path)
        .with_all_or_none(file.all_or_none);
    if let Some(field) = file.external_id_field {
        job = job.with_external_id(field);
    }
    info!(job_id = %job.id, operation = %job.operation, total = job.total(), "loaded batch file");

    if ctx.dry_run {
        return validate_only(ctx, &job, out).await;
    }

    let result = ctx.pipeline.run_with_cancel(&job, cancel).await.context("Batch sync failed")?;
    write!(out, "{}", batch_summary(&result))?;

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(report, json).with_context(|| format!("Failed to write report {}", report.display()))?;
        writeln!(out, "Report written to {}", report.display())?;
    }

    if result.failed > 0 {
        warn!(failed = result.failed, "batch finished with failures");
    }
    Ok(result.failed == 0)
}

async fn validate_only(ctx: &AppContext, job: &BatchJob, out: &mut (dyn Write + Send)) -> anyhow::Result<bool> {
    if job.operation == Operation::Delete {
        writeln!(out, "Dry run: {} records would be deleted", job.total())?;
        return Ok(true);
    }

    let mut invalid = 0;
    for (index, record) in job.records.iter().enumerate() {
        let result = ctx.pipeline.validate(&job.object_type, record, job.operation.is_partial()).await?;
        if !result.ok {
            invalid += 1;
            writeln!(out, "  record {index}: {}", result.summary())?;
        }
    }
    writeln!(out, "Dry run: {} of {} records valid", job.total() - invalid, job.total())?;
    Ok(invalid == 0)
}
