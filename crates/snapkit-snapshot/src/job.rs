//! Correlating snapshot pairs with the job that created them.

use crate::diff::FileDiffs;
use crate::snapshot::SnapshotKind;
use crate::undo::{UndoExecutor, UndoSummary};
use crate::{ComparisonInterval, Snapper, SnapshotError, SnapshotResult};
use tracing::{debug, warn};

impl Snapper {
    /// Find the pre/post pair tagged with `job_id`.
    ///
    /// Exactly one pre and one post snapshot must carry the tag. A job that
    /// was retried and left several tagged pairs is reported as ambiguous
    /// rather than resolved by list order.
    pub async fn resolve_job(
        &self,
        job_id: &str,
        config: &str,
    ) -> SnapshotResult<ComparisonInterval> {
        let tagged: Vec<_> = self
            .list_snapshots(config)
            .await?
            .into_iter()
            .filter(|snapshot| snapshot.userdata_value(&self.job_key) == Some(job_id))
            .collect();

        let of_kind = |kind: SnapshotKind| -> Vec<u32> {
            tagged
                .iter()
                .filter(|snapshot| snapshot.kind == kind)
                .map(|snapshot| snapshot.id)
                .collect()
        };
        let pre = of_kind(SnapshotKind::Pre);
        let post = of_kind(SnapshotKind::Post);

        if pre.is_empty() || post.is_empty() {
            return Err(SnapshotError::JobNotFound {
                job_id: job_id.to_string(),
                config: config.to_string(),
            });
        }

        if pre.len() > 1 || post.len() > 1 {
            warn!(job = %job_id, config = %config, ?pre, ?post, "Job matches several snapshot pairs");
            return Err(SnapshotError::AmbiguousJob {
                job_id: job_id.to_string(),
                pre,
                post,
            });
        }

        let interval = ComparisonInterval::new(pre[0], post[0]);
        debug!(job = %job_id, config = %config, %interval, "Resolved job snapshots");
        Ok(interval)
    }

    /// Undo everything a job changed.
    pub async fn undo_job(
        &self,
        executor: &dyn UndoExecutor,
        job_id: &str,
        config: &str,
    ) -> SnapshotResult<UndoSummary> {
        let interval = self.resolve_job(job_id, config).await?;
        self.undo_interval(executor, config, interval, None).await
    }

    /// Diff everything a job changed.
    pub async fn diff_job(&self, job_id: &str, config: &str) -> SnapshotResult<FileDiffs> {
        let interval = self.resolve_job(job_id, config).await?;
        self.diff_interval(config, interval, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeSnapper, StaticUsers};
    use crate::undo::MockUndoExecutor;
    use std::sync::Arc;

    fn snapper(fake: FakeSnapper) -> Snapper {
        Snapper::with_users(Arc::new(fake), Arc::new(StaticUsers::root()))
    }

    fn tagged() -> FakeSnapper {
        FakeSnapper::new()
            .with_snapshot("root", record(1, 0, 0, &[]))
            .with_snapshot("root", record(2, 1, 0, &[("jobId", "J1")]))
            .with_snapshot("root", record(3, 1, 0, &[("jobId", "J2")]))
            .with_snapshot("root", record(4, 2, 2, &[("jobId", "J1")]))
            .with_files("root", 2, 4, &[("/etc/motd", 8)])
    }

    #[tokio::test]
    async fn test_resolves_tagged_pair() {
        let interval = snapper(tagged()).resolve_job("J1", "root").await.unwrap();
        assert_eq!(interval, ComparisonInterval::new(2, 4));
    }

    #[tokio::test]
    async fn test_untagged_job() {
        let err = snapper(tagged()).resolve_job("J9", "root").await.unwrap_err();
        assert!(err.is_correlation());
        assert!(matches!(err, SnapshotError::JobNotFound { ref job_id, .. } if job_id == "J9"));
    }

    #[tokio::test]
    async fn test_pre_without_post() {
        let err = snapper(tagged()).resolve_job("J2", "root").await.unwrap_err();
        assert!(matches!(err, SnapshotError::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_retried_job_is_ambiguous() {
        let fake = tagged()
            .with_snapshot("root", record(5, 1, 0, &[("jobId", "J1")]))
            .with_snapshot("root", record(6, 2, 5, &[("jobId", "J1")]));

        let err = snapper(fake).resolve_job("J1", "root").await.unwrap_err();

        match err {
            SnapshotError::AmbiguousJob { pre, post, .. } => {
                assert_eq!(pre, vec![2, 5]);
                assert_eq!(post, vec![4, 6]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_undo_job() {
        let mut executor = MockUndoExecutor::new();
        executor
            .expect_undo_change()
            .times(1)
            .returning(|_, interval, files| {
                assert_eq!(interval, ComparisonInterval::new(2, 4));
                assert_eq!(files, ["/etc/motd"]);
                Ok("create:0 modify:1 delete:0".to_string())
            });

        let summary = snapper(tagged())
            .undo_job(&executor, "J1", "root")
            .await
            .unwrap();
        assert_eq!(summary["modify"], "1");
    }

    #[tokio::test]
    async fn test_diff_job_with_unknown_job() {
        let fake = Arc::new(tagged());
        let snapper = Snapper::with_users(fake.clone(), Arc::new(StaticUsers::root()));

        assert!(snapper.diff_job("J9", "root").await.is_err());
        assert_eq!(fake.call_count("mount"), 0);
    }
}
