//! Boundary to the external snapshot service.

use crate::error::ServiceFault;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result type for raw service calls.
pub type ServiceResult<T> = Result<T, ServiceFault>;

/// Raw positional snapshot record, as the service reports it.
///
/// Fields: number, type index, pre number, date (unix seconds, `-1` when
/// unset), owner uid, description, cleanup algorithm, userdata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot(
    pub u32,
    pub u16,
    pub u32,
    pub i64,
    pub u32,
    pub String,
    pub String,
    pub BTreeMap<String, String>,
);

/// Raw changed-file entry: path and status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile(pub String, pub u32);

/// A snapshot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInfo {
    /// Configuration name.
    pub name: String,
    /// Subvolume the configuration snapshots.
    pub subvolume: String,
    /// Upper-case keyed settings.
    pub attributes: BTreeMap<String, String>,
}

/// Synchronous request/response operations of the snapshot service.
///
/// Every call is a single attempt. Implementations report failures as
/// [`ServiceFault`]s carrying the service's symbolic error code; callers map
/// those onto typed errors.
#[async_trait]
pub trait SnapperService: Send + Sync {
    /// List all configurations.
    async fn list_configs(&self) -> ServiceResult<Vec<ConfigInfo>>;

    /// Get one configuration.
    async fn get_config(&self, config: &str) -> ServiceResult<ConfigInfo>;

    /// Replace settings of a configuration.
    async fn set_config(
        &self,
        config: &str,
        settings: &BTreeMap<String, String>,
    ) -> ServiceResult<()>;

    /// List all snapshots of a configuration.
    async fn list_snapshots(&self, config: &str) -> ServiceResult<Vec<RawSnapshot>>;

    /// Get a single snapshot.
    async fn get_snapshot(&self, config: &str, id: u32) -> ServiceResult<RawSnapshot>;

    /// Create a standalone snapshot, returning its number.
    async fn create_single_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32>;

    /// Create a pre snapshot, returning its number.
    async fn create_pre_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32>;

    /// Create a post snapshot paired with `pre`, returning its number.
    async fn create_post_snapshot(
        &self,
        config: &str,
        pre: u32,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32>;

    /// Prepare a comparison between `pre` and `post` (`0` is the live system).
    async fn create_comparison(&self, config: &str, pre: u32, post: u32) -> ServiceResult<()>;

    /// List changed files of a prepared comparison.
    async fn get_files(&self, config: &str, pre: u32, post: u32) -> ServiceResult<Vec<RawFile>>;

    /// Mount a snapshot read-only and return its root path.
    async fn mount_snapshot(&self, config: &str, id: u32, exclusive: bool)
        -> ServiceResult<String>;

    /// Unmount a snapshot.
    async fn umount_snapshot(&self, config: &str, id: u32, exclusive: bool) -> ServiceResult<()>;
}
