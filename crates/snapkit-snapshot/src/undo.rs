//! Reverting files to an earlier snapshot.

use crate::{ComparisonInterval, Snapper, SnapshotError, SnapshotResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Summary printed by the revert command, e.g. `create:0 modify:1 delete:0`.
pub type UndoSummary = BTreeMap<String, String>;

/// Runs the external revert command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UndoExecutor: Send + Sync {
    /// Revert `files` from `interval.post` back to `interval.pre` and return
    /// the command's standard output.
    async fn undo_change(
        &self,
        config: &str,
        interval: ComparisonInterval,
        files: &[String],
    ) -> SnapshotResult<String>;
}

/// [`UndoExecutor`] running `snapper undochange`.
#[derive(Debug, Clone)]
pub struct SnapperUndo {
    program: PathBuf,
}

impl SnapperUndo {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to the program.
    fn args(config: &str, interval: ComparisonInterval, files: &[String]) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            config.to_string(),
            "undochange".to_string(),
            interval.to_string(),
        ];
        args.extend(files.iter().cloned());
        args
    }
}

impl Default for SnapperUndo {
    fn default() -> Self {
        Self::new("snapper")
    }
}

#[async_trait]
impl UndoExecutor for SnapperUndo {
    async fn undo_change(
        &self,
        config: &str,
        interval: ComparisonInterval,
        files: &[String],
    ) -> SnapshotResult<String> {
        let args = Self::args(config, interval, files);
        debug!(program = %self.program.display(), args = ?args, "Running undo command");

        let output = Command::new(&self.program).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), stderr = %stderr, "Undo command failed");
            return Err(SnapshotError::UndoFailed(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Snapper {
    /// Undo changes, filling interval defaults.
    ///
    /// Files are left in the state of `pre`. Changes made after `post` are
    /// overwritten as well; use `post = 0` to undo up to the live state.
    pub async fn undo(
        &self,
        executor: &dyn UndoExecutor,
        config: &str,
        pre: Option<u32>,
        post: Option<u32>,
        files: Option<&[String]>,
    ) -> SnapshotResult<UndoSummary> {
        let interval = self.resolve_interval(config, pre, post).await?;
        self.undo_interval(executor, config, interval, files).await
    }

    /// Undo changes of a resolved interval.
    ///
    /// Without `files` (or with an empty list) every changed file is
    /// reverted. Requested files must all be part of the changed set; this
    /// is checked before the executor runs.
    pub async fn undo_interval(
        &self,
        executor: &dyn UndoExecutor,
        config: &str,
        interval: ComparisonInterval,
        files: Option<&[String]>,
    ) -> SnapshotResult<UndoSummary> {
        let changed: BTreeSet<String> = self.compare(config, interval).await?.into_keys().collect();

        let requested: BTreeSet<String> = match files {
            Some(files) if !files.is_empty() => files.iter().cloned().collect(),
            _ => changed.clone(),
        };

        if !requested.is_subset(&changed) {
            return Err(SnapshotError::FilesNotChanged(
                changed.difference(&requested).cloned().collect(),
            ));
        }

        let requested: Vec<String> = requested.into_iter().collect();
        let output = executor.undo_change(config, interval, &requested).await?;
        let summary = parse_undo_output(&output)?;

        info!(config = %config, %interval, files = requested.len(), summary = ?summary, "Undid changes");
        Ok(summary)
    }
}

/// Parse whitespace-separated `key:value` tokens.
///
/// Any token without a `:` rejects the whole output.
pub fn parse_undo_output(output: &str) -> SnapshotResult<UndoSummary> {
    output
        .split_whitespace()
        .map(|token| {
            token
                .split_once(':')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| SnapshotError::MalformedUndoOutput(token.to_string()))
        })
        .collect()
}
