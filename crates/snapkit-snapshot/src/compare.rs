//! Per-file change status between two snapshots.

use crate::error::FaultContext;
use crate::{ComparisonInterval, Snapper, SnapshotResult};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// How a file differs across a comparison.
///
/// A bitmask over [`ChangeStatus::CREATED`], [`ChangeStatus::DELETED`],
/// [`ChangeStatus::MODIFIED`] and [`ChangeStatus::PATH_CHANGED`]. The raw code
/// is kept, so codes outside that table are reported as unknown instead of
/// being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeStatus(u32);

impl ChangeStatus {
    pub const CREATED: u32 = 1;
    pub const DELETED: u32 = 2;
    pub const MODIFIED: u32 = 8;
    pub const PATH_CHANGED: u32 = 16;

    const KNOWN: u32 = Self::CREATED | Self::DELETED | Self::MODIFIED | Self::PATH_CHANGED;

    const LABELS: [(u32, &'static str); 4] = [
        (Self::CREATED, "created"),
        (Self::DELETED, "deleted"),
        (Self::MODIFIED, "modified"),
        (Self::PATH_CHANGED, "path"),
    ];

    pub fn from_code(code: u32) -> Self {
        Self(code)
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// No known flag, or a flag outside the known table.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0 || self.0 & !Self::KNOWN != 0
    }

    pub fn is_created(&self) -> bool {
        self.contains(Self::CREATED)
    }

    pub fn is_deleted(&self) -> bool {
        self.contains(Self::DELETED)
    }

    pub fn is_modified(&self) -> bool {
        self.contains(Self::MODIFIED)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown");
        }
        let labels: Vec<&str> = Self::LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect();
        f.write_str(&labels.join("+"))
    }
}

impl Serialize for ChangeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Changed files of one comparison, keyed by absolute path.
pub type ChangeSet = BTreeMap<String, ChangeStatus>;

impl Snapper {
    /// Compare two snapshots, filling interval defaults.
    pub async fn status(
        &self,
        config: &str,
        pre: Option<u32>,
        post: Option<u32>,
    ) -> SnapshotResult<ChangeSet> {
        let interval = self.resolve_interval(config, pre, post).await?;
        self.compare(config, interval).await
    }

    /// Paths changed between two snapshots, filling interval defaults.
    pub async fn changed_files(
        &self,
        config: &str,
        pre: Option<u32>,
        post: Option<u32>,
    ) -> SnapshotResult<BTreeSet<String>> {
        Ok(self.status(config, pre, post).await?.into_keys().collect())
    }

    /// Compare a resolved interval.
    pub async fn compare(
        &self,
        config: &str,
        interval: ComparisonInterval,
    ) -> SnapshotResult<ChangeSet> {
        let context = "listing changed files";

        self.service
            .create_comparison(config, interval.pre, interval.post)
            .await
            .in_config(config, context)?;

        let files = self
            .service
            .get_files(config, interval.pre, interval.post)
            .await
            .in_config(config, context)?;

        let changes: ChangeSet = files
            .into_iter()
            .map(|file| (file.0, ChangeStatus::from_code(file.1)))
            .collect();

        let unknown = changes.values().filter(|s| s.is_unknown()).count();
        if unknown > 0 {
            debug!(config = %config, %interval, unknown, "Comparison reported unknown status codes");
        }
        info!(config = %config, %interval, files = changes.len(), "Compared snapshots");

        Ok(changes)
    }
}
