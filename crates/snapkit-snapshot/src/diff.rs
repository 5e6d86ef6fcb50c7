//! Text diffs between snapshot images.

use crate::{ComparisonInterval, Snapper, SnapshotResult};
use similar::TextDiff;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// How much of a file is inspected to decide whether it is text.
const SNIFF_LEN: usize = 8192;

/// Unified diffs keyed by path.
pub type FileDiffs = BTreeMap<String, String>;

impl Snapper {
    /// Diff snapshots, filling interval defaults.
    ///
    /// Without `filename` every changed file of the interval is considered.
    pub async fn diff(
        &self,
        config: &str,
        pre: Option<u32>,
        post: Option<u32>,
        filename: Option<&str>,
    ) -> SnapshotResult<FileDiffs> {
        let interval = self.resolve_interval(config, pre, post).await?;
        self.diff_interval(config, interval, filename).await
    }

    /// Diff a resolved interval.
    ///
    /// Both snapshots are mounted for the duration of the call and released
    /// again on every path out of it.
    pub async fn diff_interval(
        &self,
        config: &str,
        interval: ComparisonInterval,
        filename: Option<&str>,
    ) -> SnapshotResult<FileDiffs> {
        let files: Vec<String> = match filename {
            Some(filename) => vec![filename.to_string()],
            None => self.compare(config, interval).await?.into_keys().collect(),
        };

        let service = self.service.as_ref();
        let pre_root = self.mounts.acquire(service, config, interval.pre).await?;
        let post_root = if interval.is_live() {
            String::new()
        } else {
            match self.mounts.acquire(service, config, interval.post).await {
                Ok(root) => root,
                Err(e) => {
                    self.mounts.release(service, config, interval.pre).await?;
                    return Err(e);
                }
            }
        };

        let result = diff_files(&files, &pre_root, &post_root).await;

        let released_pre = self.mounts.release(service, config, interval.pre).await;
        let released_post = if interval.is_live() {
            Ok(())
        } else {
            self.mounts.release(service, config, interval.post).await
        };

        let diffs = result?;
        released_pre?;
        released_post?;

        info!(config = %config, %interval, files = files.len(), diffs = diffs.len(), "Computed diffs");
        Ok(diffs)
    }
}

/// Diff each live regular file against its images under the two roots.
async fn diff_files(
    files: &[String],
    pre_root: &str,
    post_root: &str,
) -> SnapshotResult<FileDiffs> {
    let mut diffs = FileDiffs::new();

    for file in files {
        if !is_file(Path::new(file)).await {
            debug!(file = %file, "Skipping path that is not a live regular file");
            continue;
        }

        let pre_file = format!("{pre_root}{file}");
        let post_file = format!("{post_root}{file}");

        let pre_content = read_if_file(&pre_file).await?;
        let post_content = read_if_file(&post_file).await?;

        let (pre_content, post_content) = match (pre_content, post_content) {
            (None, None) => continue,
            (pre, post) => (pre.unwrap_or_default(), post.unwrap_or_default()),
        };

        if !post_content.is_empty() && !is_text(&post_content) {
            debug!(file = %post_file, "Skipping binary file");
            continue;
        }

        let diff = unified_diff(&pre_content, &post_content, &pre_file, &post_file);
        if !diff.is_empty() {
            diffs.insert(file.clone(), diff);
        }
    }

    Ok(diffs)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn read_if_file(path: &str) -> SnapshotResult<Option<Vec<u8>>> {
    if is_file(Path::new(path)).await {
        Ok(Some(fs::read(path).await?))
    } else {
        Ok(None)
    }
}

/// Content sniffing: no NUL byte and valid UTF-8 in the leading bytes.
fn is_text(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(SNIFF_LEN)];
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        // A multi-byte character cut off by the sample boundary.
        Err(e) => e.error_len().is_none() && content.len() > SNIFF_LEN,
    }
}

/// Line-based unified diff with three lines of context.
fn unified_diff(old: &[u8], new: &[u8], from: &str, to: &str) -> String {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    TextDiff::from_lines(old.as_ref(), new.as_ref())
        .unified_diff()
        .context_radius(3)
        .header(from, to)
        .to_string()
}
