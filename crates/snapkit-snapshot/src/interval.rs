//! Comparison intervals and their defaults.

use crate::{Snapper, SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A pair of snapshots to compare.
///
/// `post == 0` stands for the live filesystem, not a real snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonInterval {
    pub pre: u32,
    pub post: u32,
}

impl ComparisonInterval {
    /// Snapshot number standing for the live filesystem.
    pub const LIVE: u32 = 0;

    pub fn new(pre: u32, post: u32) -> Self {
        Self { pre, post }
    }

    /// Compare `pre` against the live filesystem.
    pub fn against_live(pre: u32) -> Self {
        Self::new(pre, Self::LIVE)
    }

    /// Whether the post side is the live filesystem.
    pub fn is_live(&self) -> bool {
        self.post == Self::LIVE
    }
}

impl fmt::Display for ComparisonInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pre, self.post)
    }
}

impl Snapper {
    /// Fill in a comparison interval.
    ///
    /// A missing `post` means the live filesystem; a missing `pre` means the
    /// newest snapshot of `config`. Explicit numbers are used verbatim, the
    /// service validates them when the comparison is requested.
    pub async fn resolve_interval(
        &self,
        config: &str,
        pre: Option<u32>,
        post: Option<u32>,
    ) -> SnapshotResult<ComparisonInterval> {
        let post = post.unwrap_or(ComparisonInterval::LIVE);
        let pre = match pre {
            Some(pre) => pre,
            None => self.last_snapshot_id(config).await?,
        };

        debug!(config = %config, pre, post, "Resolved comparison interval");
        Ok(ComparisonInterval::new(pre, post))
    }

    async fn last_snapshot_id(&self, config: &str) -> SnapshotResult<u32> {
        self.list_snapshots(config)
            .await?
            .iter()
            .map(|snapshot| snapshot.id)
            .max()
            .ok_or_else(|| SnapshotError::NoSnapshots(config.to_string()))
    }
}
