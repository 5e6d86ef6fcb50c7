//! Status, diff and undo command handlers.

use super::Context;
use anyhow::Result;
use snapkit_snapshot::{ChangeSet, FileDiffs, UndoSummary};

/// Snapshot pair selection shared by the comparison commands.
///
/// Without `--pre` the newest snapshot is used; without `--post` the live
/// filesystem.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct IntervalArgs {
    /// Earlier snapshot number
    #[arg(long)]
    pub pre: Option<u32>,
    /// Later snapshot number (0 for the live filesystem)
    #[arg(long)]
    pub post: Option<u32>,
}

/// Show the change status of every changed file.
pub async fn handle_status(ctx: &Context, interval: IntervalArgs) -> Result<()> {
    let changes = ctx
        .snapper
        .status(&ctx.config, interval.pre, interval.post)
        .await?;
    ctx.emit(&changes, print_changes)
}

/// List the changed paths.
pub async fn handle_changed(ctx: &Context, interval: IntervalArgs) -> Result<()> {
    let files = ctx
        .snapper
        .changed_files(&ctx.config, interval.pre, interval.post)
        .await?;
    ctx.emit(&files, |files| {
        for file in files {
            println!("{file}");
        }
    })
}

/// Show unified diffs of changed text files.
pub async fn handle_diff(ctx: &Context, interval: IntervalArgs, file: Option<&str>) -> Result<()> {
    let diffs = ctx
        .snapper
        .diff(&ctx.config, interval.pre, interval.post, file)
        .await?;
    ctx.emit(&diffs, print_diffs)
}

/// Revert changed files to the earlier snapshot.
pub async fn handle_undo(ctx: &Context, interval: IntervalArgs, files: &[String]) -> Result<()> {
    let files = (!files.is_empty()).then_some(files);
    let summary = ctx
        .snapper
        .undo(&ctx.undo, &ctx.config, interval.pre, interval.post, files)
        .await?;
    ctx.emit(&summary, print_summary)
}

pub(crate) fn print_changes(changes: &ChangeSet) {
    for (path, status) in changes {
        println!("{:<16} {path}", status.to_string());
    }
}

pub(crate) fn print_diffs(diffs: &FileDiffs) {
    for diff in diffs.values() {
        print!("{diff}");
        if !diff.ends_with('\n') {
            println!();
        }
    }
}

pub(crate) fn print_summary(summary: &UndoSummary) {
    for (action, count) in summary {
        println!("{action}: {count}");
    }
}
