//! The [`Snapper`] handle.

use crate::config::{service_settings, ConfigValue};
use crate::error::FaultContext;
use crate::mount::MountRegistry;
use crate::service::{ConfigInfo, SnapperService};
use crate::snapshot::{CreateSnapshot, Snapshot, SnapshotKind};
use crate::users::{SystemUsers, UserResolver};
use crate::{ComparisonInterval, SnapshotError, SnapshotResult};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Userdata key used to tag snapshots with a job identifier.
pub const DEFAULT_JOB_KEY: &str = "jobId";

/// Handle to a snapshot service.
///
/// All snapshot operations go through this handle. It is cheap to share
/// behind an `Arc` and mounts taken through it are reference counted, so
/// concurrent diffs on the same configuration do not unmount each other.
pub struct Snapper {
    pub(crate) service: Arc<dyn SnapperService>,
    pub(crate) users: Arc<dyn UserResolver>,
    pub(crate) mounts: MountRegistry,
    pub(crate) job_key: String,
}

impl Snapper {
    /// Create a handle resolving owners through the system user database.
    pub fn new(service: Arc<dyn SnapperService>) -> Self {
        Self::with_users(service, Arc::new(SystemUsers))
    }

    /// Create a handle with a custom user resolver.
    pub fn with_users(service: Arc<dyn SnapperService>, users: Arc<dyn UserResolver>) -> Self {
        Self {
            service,
            users,
            mounts: MountRegistry::new(),
            job_key: DEFAULT_JOB_KEY.to_string(),
        }
    }

    /// Use a different userdata key for job identifiers.
    pub fn with_job_key(mut self, job_key: impl Into<String>) -> Self {
        self.job_key = job_key.into();
        self
    }

    /// Userdata key used for job identifiers.
    pub fn job_key(&self) -> &str {
        &self.job_key
    }

    /// List all configurations.
    pub async fn list_configs(&self) -> SnapshotResult<Vec<ConfigInfo>> {
        self.service
            .list_configs()
            .await
            .in_config("", "listing configurations")
    }

    /// Retrieve all settings of a configuration.
    pub async fn get_config(&self, config: &str) -> SnapshotResult<ConfigInfo> {
        self.service
            .get_config(config)
            .await
            .in_config(config, "retrieving configuration")
    }

    /// Set configuration values.
    pub async fn set_config(
        &self,
        config: &str,
        settings: &BTreeMap<String, ConfigValue>,
    ) -> SnapshotResult<()> {
        let settings = service_settings(settings);
        debug!(config = %config, keys = ?settings.keys().collect::<Vec<_>>(), "Setting configuration");
        self.service
            .set_config(config, &settings)
            .await
            .in_config(config, &format!("setting configuration {config}"))
    }

    /// List all snapshots of a configuration, in service order.
    pub async fn list_snapshots(&self, config: &str) -> SnapshotResult<Vec<Snapshot>> {
        let raw = self
            .service
            .list_snapshots(config)
            .await
            .in_config(config, "listing snapshots")?;

        raw.into_iter()
            .map(|record| Snapshot::from_raw(record, self.users.as_ref()))
            .collect()
    }

    /// Get a single snapshot.
    pub async fn get_snapshot(&self, config: &str, id: u32) -> SnapshotResult<Snapshot> {
        let raw = self
            .service
            .get_snapshot(config, id)
            .await
            .in_config(config, "retrieving snapshot")?;
        Snapshot::from_raw(raw, self.users.as_ref())
    }

    /// Create a snapshot and return its number.
    pub async fn create_snapshot(
        &self,
        config: &str,
        request: &CreateSnapshot,
    ) -> SnapshotResult<u32> {
        let description = request.effective_description();
        let cleanup = request.cleanup.as_str();
        let userdata = request.effective_userdata(&self.job_key);
        let context = "creating snapshot";

        let id = match request.kind {
            SnapshotKind::Single => self
                .service
                .create_single_snapshot(config, &description, cleanup, &userdata)
                .await
                .in_config(config, context)?,
            SnapshotKind::Pre => self
                .service
                .create_pre_snapshot(config, &description, cleanup, &userdata)
                .await
                .in_config(config, context)?,
            SnapshotKind::Post => {
                let pre = request.pre_id.ok_or_else(|| {
                    SnapshotError::validation(
                        "pre snapshot number needs to be specified for snapshots of the 'post' type",
                    )
                })?;
                self.service
                    .create_post_snapshot(config, pre, &description, cleanup, &userdata)
                    .await
                    .in_config(config, context)?
            }
        };

        info!(config = %config, id, kind = %request.kind, job = ?request.job_id, "Created snapshot");
        Ok(id)
    }

    /// Run `op` between a pre and a post snapshot.
    ///
    /// Both snapshots are created from `template` (its kind and pre number
    /// are ignored), so they share description, cleanup algorithm, userdata
    /// and job tag. Returns the snapshot pair and the output of `op`.
    pub async fn run<F, Fut, T>(
        &self,
        config: &str,
        template: &CreateSnapshot,
        op: F,
    ) -> SnapshotResult<(ComparisonInterval, T)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut pre_request = template.clone();
        pre_request.kind = SnapshotKind::Pre;
        pre_request.pre_id = None;
        let pre = self.create_snapshot(config, &pre_request).await?;

        let output = op().await;

        let mut post_request = template.clone();
        post_request.kind = SnapshotKind::Post;
        post_request.pre_id = Some(pre);
        let post = self.create_snapshot(config, &post_request).await?;

        Ok((ComparisonInterval::new(pre, post), output))
    }
}
