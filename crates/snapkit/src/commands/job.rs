//! Job-based command handlers.

use super::compare::{print_diffs, print_summary};
use super::Context;
use anyhow::Result;

/// Show the snapshot pair a job created.
pub async fn handle_job(ctx: &Context, job_id: &str) -> Result<()> {
    let interval = ctx.snapper.resolve_job(job_id, &ctx.config).await?;
    ctx.emit(&interval, |interval| println!("{interval}"))
}

/// Revert the changes a job made.
pub async fn handle_undo_job(ctx: &Context, job_id: &str) -> Result<()> {
    let summary = ctx
        .snapper
        .undo_job(&ctx.undo, job_id, &ctx.config)
        .await?;
    ctx.emit(&summary, print_summary)
}

/// Show the changes a job made.
pub async fn handle_diff_job(ctx: &Context, job_id: &str) -> Result<()> {
    let diffs = ctx.snapper.diff_job(job_id, &ctx.config).await?;
    ctx.emit(&diffs, print_diffs)
}
