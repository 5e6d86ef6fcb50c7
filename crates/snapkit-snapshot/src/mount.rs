//! Reference-counted snapshot mounts.

use crate::error::FaultContext;
use crate::service::SnapperService;
use crate::SnapshotResult;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Mount {
    root: String,
    open: usize,
}

/// Tracks snapshots mounted through one handle.
///
/// The service does not count mounts, so two callers sharing a snapshot
/// would otherwise unmount it under each other. The first acquire mounts,
/// the last release unmounts.
#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: Mutex<HashMap<(String, u32), Mount>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a snapshot (if not yet mounted) and return its root path.
    pub async fn acquire(
        &self,
        service: &dyn SnapperService,
        config: &str,
        id: u32,
    ) -> SnapshotResult<String> {
        let mut mounts = self.mounts.lock().await;
        let key = (config.to_string(), id);

        if let Some(mount) = mounts.get_mut(&key) {
            mount.open += 1;
            debug!(config = %config, id, open = mount.open, "Reusing snapshot mount");
            return Ok(mount.root.clone());
        }

        let root = service
            .mount_snapshot(config, id, false)
            .await
            .in_config(config, "mounting snapshot")?;
        debug!(config = %config, id, root = %root, "Mounted snapshot");

        mounts.insert(
            key,
            Mount {
                root: root.clone(),
                open: 1,
            },
        );
        Ok(root)
    }

    /// Drop one reference, unmounting with the last one.
    pub async fn release(
        &self,
        service: &dyn SnapperService,
        config: &str,
        id: u32,
    ) -> SnapshotResult<()> {
        let mut mounts = self.mounts.lock().await;
        let key = (config.to_string(), id);

        match mounts.get_mut(&key) {
            Some(mount) if mount.open > 1 => {
                mount.open -= 1;
                return Ok(());
            }
            Some(_) => {
                mounts.remove(&key);
            }
            None => {}
        }

        service
            .umount_snapshot(config, id, false)
            .await
            .in_config(config, "unmounting snapshot")?;
        debug!(config = %config, id, "Unmounted snapshot");
        Ok(())
    }

    /// Number of distinct snapshots currently mounted.
    pub async fn open_mounts(&self) -> usize {
        self.mounts.lock().await.len()
    }
}
