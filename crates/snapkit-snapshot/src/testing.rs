//! Test doubles for the snapshot service and user database.

use crate::error::ServiceFault;
use crate::service::{ConfigInfo, RawFile, RawSnapshot, ServiceResult, SnapperService};
use crate::users::UserResolver;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Fixed uid → name table.
#[derive(Debug, Default, Clone)]
pub struct StaticUsers(HashMap<u32, String>);

impl StaticUsers {
    /// Table containing only `0 → root`.
    pub fn root() -> Self {
        Self(HashMap::from([(0, "root".to_string())]))
    }
}

impl UserResolver for StaticUsers {
    fn user_name(&self, uid: u32) -> Option<String> {
        self.0.get(&uid).cloned()
    }
}

/// Build a raw record owned by uid 0 with the given userdata.
pub fn record(id: u32, type_index: u16, pre: u32, userdata: &[(&str, &str)]) -> RawSnapshot {
    RawSnapshot(
        id,
        type_index,
        pre,
        1457006571 + i64::from(id),
        0,
        format!("snapshot {id}"),
        String::new(),
        userdata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[derive(Default)]
struct FakeState {
    configs: BTreeMap<String, ConfigInfo>,
    snapshots: BTreeMap<String, Vec<RawSnapshot>>,
    files: HashMap<(String, u32, u32), Vec<RawFile>>,
    mount_roots: HashMap<(String, u32), String>,
    failing_mounts: HashSet<u32>,
    mounted: HashMap<(String, u32), usize>,
    calls: Vec<String>,
}

impl FakeState {
    fn check_config(&self, config: &str) -> ServiceResult<()> {
        if self.configs.contains_key(config) {
            Ok(())
        } else {
            Err(ServiceFault::new(ServiceFault::UNKNOWN_CONFIG, ""))
        }
    }

    fn find(&self, config: &str, id: u32) -> ServiceResult<RawSnapshot> {
        self.check_config(config)?;
        self.snapshots
            .get(config)
            .and_then(|list| list.iter().find(|s| s.0 == id))
            .cloned()
            .ok_or_else(|| ServiceFault::new(ServiceFault::ILLEGAL_SNAPSHOT, ""))
    }

    fn create(
        &mut self,
        config: &str,
        type_index: u16,
        pre: u32,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.check_config(config)?;
        let list = self.snapshots.entry(config.to_string()).or_default();
        let id = list.iter().map(|s| s.0).max().unwrap_or(0) + 1;
        list.push(RawSnapshot(
            id,
            type_index,
            pre,
            -1,
            0,
            description.to_string(),
            cleanup.to_string(),
            userdata.clone(),
        ));
        Ok(id)
    }
}

/// In-memory snapshot service that records every call.
pub struct FakeSnapper {
    state: Mutex<FakeState>,
}

impl FakeSnapper {
    /// A service with a single empty `root` configuration.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
        .with_config("root")
    }

    pub fn with_config(self, name: &str) -> Self {
        self.state.lock().unwrap().configs.insert(
            name.to_string(),
            ConfigInfo {
                name: name.to_string(),
                subvolume: if name == "root" {
                    "/".to_string()
                } else {
                    format!("/{name}")
                },
                attributes: BTreeMap::from([("FSTYPE".to_string(), "btrfs".to_string())]),
            },
        );
        self
    }

    pub fn with_snapshot(self, config: &str, snapshot: RawSnapshot) -> Self {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .entry(config.to_string())
            .or_default()
            .push(snapshot);
        self
    }

    pub fn with_files(self, config: &str, pre: u32, post: u32, files: &[(&str, u32)]) -> Self {
        self.state.lock().unwrap().files.insert(
            (config.to_string(), pre, post),
            files
                .iter()
                .map(|(path, code)| RawFile(path.to_string(), *code))
                .collect(),
        );
        self
    }

    pub fn with_mount_root(self, config: &str, id: u32, root: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .mount_roots
            .insert((config.to_string(), id), root.into());
        self
    }

    /// Make mounting snapshot `id` fail.
    pub fn failing_mount(self, id: u32) -> Self {
        self.state.lock().unwrap().failing_mounts.insert(id);
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Current mount count of a snapshot.
    pub fn mounted(&self, config: &str, id: u32) -> usize {
        self.state
            .lock()
            .unwrap()
            .mounted
            .get(&(config.to_string(), id))
            .copied()
            .unwrap_or(0)
    }

    /// Stored raw records of a configuration.
    pub fn snapshots(&self, config: &str) -> Vec<RawSnapshot> {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .get(config)
            .cloned()
            .unwrap_or_default()
    }

    fn record_call(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl Default for FakeSnapper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapperService for FakeSnapper {
    async fn list_configs(&self) -> ServiceResult<Vec<ConfigInfo>> {
        self.record_call("list_configs".to_string());
        Ok(self.state.lock().unwrap().configs.values().cloned().collect())
    }

    async fn get_config(&self, config: &str) -> ServiceResult<ConfigInfo> {
        self.record_call(format!("get_config {config}"));
        let state = self.state.lock().unwrap();
        state.check_config(config)?;
        Ok(state.configs[config].clone())
    }

    async fn set_config(
        &self,
        config: &str,
        settings: &BTreeMap<String, String>,
    ) -> ServiceResult<()> {
        self.record_call(format!("set_config {config}"));
        let mut state = self.state.lock().unwrap();
        state.check_config(config)?;
        if let Some(info) = state.configs.get_mut(config) {
            info.attributes
                .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(())
    }

    async fn list_snapshots(&self, config: &str) -> ServiceResult<Vec<RawSnapshot>> {
        self.record_call(format!("list_snapshots {config}"));
        let state = self.state.lock().unwrap();
        state.check_config(config)?;
        Ok(state.snapshots.get(config).cloned().unwrap_or_default())
    }

    async fn get_snapshot(&self, config: &str, id: u32) -> ServiceResult<RawSnapshot> {
        self.record_call(format!("get_snapshot {config} {id}"));
        self.state.lock().unwrap().find(config, id)
    }

    async fn create_single_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.record_call(format!("create_single {config}"));
        self.state
            .lock()
            .unwrap()
            .create(config, 0, 0, description, cleanup, userdata)
    }

    async fn create_pre_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.record_call(format!("create_pre {config}"));
        self.state
            .lock()
            .unwrap()
            .create(config, 1, 0, description, cleanup, userdata)
    }

    async fn create_post_snapshot(
        &self,
        config: &str,
        pre: u32,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.record_call(format!("create_post {config} {pre}"));
        let mut state = self.state.lock().unwrap();
        state.find(config, pre)?;
        state.create(config, 2, pre, description, cleanup, userdata)
    }

    async fn create_comparison(&self, config: &str, pre: u32, post: u32) -> ServiceResult<()> {
        self.record_call(format!("create_comparison {config} {pre} {post}"));
        let state = self.state.lock().unwrap();
        state.find(config, pre)?;
        if post != 0 {
            state.find(config, post)?;
        }
        Ok(())
    }

    async fn get_files(&self, config: &str, pre: u32, post: u32) -> ServiceResult<Vec<RawFile>> {
        self.record_call(format!("get_files {config} {pre} {post}"));
        let state = self.state.lock().unwrap();
        state.check_config(config)?;
        Ok(state
            .files
            .get(&(config.to_string(), pre, post))
            .cloned()
            .unwrap_or_default())
    }

    async fn mount_snapshot(
        &self,
        config: &str,
        id: u32,
        exclusive: bool,
    ) -> ServiceResult<String> {
        self.record_call(format!("mount {config} {id} {exclusive}"));
        let mut state = self.state.lock().unwrap();
        state.find(config, id)?;
        if state.failing_mounts.contains(&id) {
            return Err(ServiceFault::new("error.io_error", "mount failed"));
        }
        *state.mounted.entry((config.to_string(), id)).or_default() += 1;
        Ok(state
            .mount_roots
            .get(&(config.to_string(), id))
            .cloned()
            .unwrap_or_else(|| format!("/.snapshots/{id}/snapshot")))
    }

    async fn umount_snapshot(&self, config: &str, id: u32, exclusive: bool) -> ServiceResult<()> {
        self.record_call(format!("umount {config} {id} {exclusive}"));
        let mut state = self.state.lock().unwrap();
        state.find(config, id)?;
        match state.mounted.get_mut(&(config.to_string(), id)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(())
            }
            _ => Err(ServiceFault::new("error.umount_failed", "not mounted")),
        }
    }
}
