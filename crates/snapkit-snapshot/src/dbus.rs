//! [`SnapperService`] over the D-Bus system bus.
//!
//! Method calls go to `org.opensuse.Snapper` at `/org/opensuse/Snapper`.
//! Error replies keep their D-Bus error name (`error.unknown_config`,
//! `error.illegal_snapshot`, ...) as the fault code.

use crate::error::ServiceFault;
use crate::service::{ConfigInfo, RawFile, RawSnapshot, ServiceResult, SnapperService};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use zbus::zvariant::{DynamicType, Type};
use zbus::Connection;

const DESTINATION: &str = "org.opensuse.Snapper";
const OBJECT_PATH: &str = "/org/opensuse/Snapper";
const INTERFACE: &str = "org.opensuse.Snapper";

/// Wire form of a snapshot, `(uquxussa{ss})`.
type SnapshotRecord = (u32, u16, u32, i64, u32, String, String, BTreeMap<String, String>);

/// Wire form of a configuration, `(ssa{ss})`.
type ConfigRecord = (String, String, BTreeMap<String, String>);

/// Snapper client talking to the daemon over D-Bus.
///
/// The connection is opened on the first call and reused afterwards.
#[derive(Debug, Default)]
pub struct DbusSnapper {
    /// Bus address; the system bus when unset.
    address: Option<String>,
    connection: OnceCell<Connection>,
}

impl DbusSnapper {
    /// Client for the system bus.
    pub fn system() -> Self {
        Self::default()
    }

    /// Client for the bus at `address`, e.g. `unix:path=/run/dbus/system_bus_socket`.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> ServiceResult<&Connection> {
        self.connection
            .get_or_try_init(|| async {
                let connection = match &self.address {
                    Some(address) => {
                        zbus::connection::Builder::address(address.as_str())?
                            .build()
                            .await?
                    }
                    None => Connection::system().await?,
                };
                debug!(address = ?self.address, "Connected to bus");
                Ok::<_, zbus::Error>(connection)
            })
            .await
            .map_err(fault_from_error)
    }

    /// Call a method, discarding the reply body.
    async fn call<B>(&self, method: &str, body: &B) -> ServiceResult<()>
    where
        B: Serialize + DynamicType,
    {
        self.call_message(method, body).await.map(|_| ())
    }

    /// Call a method and decode its single return value.
    async fn call_decoded<B, T>(&self, method: &str, body: &B) -> ServiceResult<T>
    where
        B: Serialize + DynamicType,
        T: DeserializeOwned + Type,
    {
        let reply = self.call_message(method, body).await?;
        reply
            .body()
            .deserialize::<T>()
            .map_err(|e| ServiceFault::new(ServiceFault::UNKNOWN, format!("{method}: {e}")))
    }

    async fn call_message<B>(&self, method: &str, body: &B) -> ServiceResult<zbus::Message>
    where
        B: Serialize + DynamicType,
    {
        let connection = self.connection().await?;
        debug!(method = %method, "Calling snapper");

        connection
            .call_method(Some(DESTINATION), OBJECT_PATH, Some(INTERFACE), method, body)
            .await
            .map_err(|e| {
                let fault = fault_from_error(e);
                warn!(method = %method, code = %fault.code, "Snapper call failed");
                fault
            })
    }
}

/// Fault for a failed call. Error replies keep their name as the code.
fn fault_from_error(error: zbus::Error) -> ServiceFault {
    match error {
        zbus::Error::MethodError(name, message, _) => {
            fault_from_error_reply(&name.to_string(), message.as_deref())
        }
        other => ServiceFault::new(ServiceFault::UNKNOWN, other.to_string()),
    }
}

fn fault_from_error_reply(name: &str, message: Option<&str>) -> ServiceFault {
    ServiceFault::new(name, message.unwrap_or(name))
}

fn raw_snapshot(record: SnapshotRecord) -> RawSnapshot {
    let (id, kind, pre, date, uid, description, cleanup, userdata) = record;
    RawSnapshot(id, kind, pre, date, uid, description, cleanup, userdata)
}

fn config_info((name, subvolume, attributes): ConfigRecord) -> ConfigInfo {
    ConfigInfo {
        name,
        subvolume,
        attributes,
    }
}

#[async_trait]
impl SnapperService for DbusSnapper {
    async fn list_configs(&self) -> ServiceResult<Vec<ConfigInfo>> {
        let records: Vec<ConfigRecord> = self.call_decoded("ListConfigs", &()).await?;
        Ok(records.into_iter().map(config_info).collect())
    }

    async fn get_config(&self, config: &str) -> ServiceResult<ConfigInfo> {
        let record: ConfigRecord = self.call_decoded("GetConfig", &(config,)).await?;
        Ok(config_info(record))
    }

    async fn set_config(
        &self,
        config: &str,
        settings: &BTreeMap<String, String>,
    ) -> ServiceResult<()> {
        self.call("SetConfig", &(config, settings)).await
    }

    async fn list_snapshots(&self, config: &str) -> ServiceResult<Vec<RawSnapshot>> {
        let records: Vec<SnapshotRecord> = self.call_decoded("ListSnapshots", &(config,)).await?;
        Ok(records.into_iter().map(raw_snapshot).collect())
    }

    async fn get_snapshot(&self, config: &str, id: u32) -> ServiceResult<RawSnapshot> {
        let record: SnapshotRecord = self.call_decoded("GetSnapshot", &(config, id)).await?;
        Ok(raw_snapshot(record))
    }

    async fn create_single_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.call_decoded(
            "CreateSingleSnapshot",
            &(config, description, cleanup, userdata),
        )
        .await
    }

    async fn create_pre_snapshot(
        &self,
        config: &str,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.call_decoded(
            "CreatePreSnapshot",
            &(config, description, cleanup, userdata),
        )
        .await
    }

    async fn create_post_snapshot(
        &self,
        config: &str,
        pre: u32,
        description: &str,
        cleanup: &str,
        userdata: &BTreeMap<String, String>,
    ) -> ServiceResult<u32> {
        self.call_decoded(
            "CreatePostSnapshot",
            &(config, pre, description, cleanup, userdata),
        )
        .await
    }

    async fn create_comparison(&self, config: &str, pre: u32, post: u32) -> ServiceResult<()> {
        self.call("CreateComparison", &(config, pre, post)).await
    }

    async fn get_files(&self, config: &str, pre: u32, post: u32) -> ServiceResult<Vec<RawFile>> {
        let files: Vec<(String, u32)> = self
            .call_decoded("GetFiles", &(config, pre, post))
            .await?;
        Ok(files
            .into_iter()
            .map(|(path, status)| RawFile(path, status))
            .collect())
    }

    async fn mount_snapshot(
        &self,
        config: &str,
        id: u32,
        exclusive: bool,
    ) -> ServiceResult<String> {
        self.call_decoded("MountSnapshot", &(config, id, exclusive))
            .await
    }

    async fn umount_snapshot(&self, config: &str, id: u32, exclusive: bool) -> ServiceResult<()> {
        self.call("UmountSnapshot", &(config, id, exclusive)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_signatures() {
        assert_eq!(SnapshotRecord::SIGNATURE.to_string(), "(uquxussa{ss})");
        assert_eq!(ConfigRecord::SIGNATURE.to_string(), "(ssa{ss})");
        assert_eq!(<(String, u32)>::SIGNATURE.to_string(), "(su)");
    }

    #[test]
    fn test_error_reply_keeps_name() {
        let fault = fault_from_error_reply(
            "error.unknown_config",
            Some("org.freedesktop.DBus.Error.Failed"),
        );
        assert_eq!(fault.code, ServiceFault::UNKNOWN_CONFIG);
        assert_eq!(fault.message, "org.freedesktop.DBus.Error.Failed");

        let fault = fault_from_error_reply("error.illegal_snapshot", None);
        assert_eq!(fault.code, ServiceFault::ILLEGAL_SNAPSHOT);
        assert_eq!(fault.message, "error.illegal_snapshot");
    }

    #[test]
    fn test_other_errors_are_unknown() {
        let fault = fault_from_error(zbus::Error::Failure("connection reset".to_string()));
        assert_eq!(fault.code, ServiceFault::UNKNOWN);
        assert!(fault.message.contains("connection reset"));
    }

    #[test]
    fn test_record_conversion() {
        let record: SnapshotRecord = (
            43,
            2,
            42,
            1457006572,
            0,
            "Blah Blah".to_string(),
            String::new(),
            BTreeMap::from([("jobId".to_string(), "J1".to_string())]),
        );
        let raw = raw_snapshot(record);
        assert_eq!(raw.0, 43);
        assert_eq!(raw.2, 42);
        assert_eq!(raw.7["jobId"], "J1");
    }

    #[tokio::test]
    async fn test_unreachable_bus_is_a_fault() {
        let dir = tempfile::tempdir().unwrap();
        let address = format!("unix:path={}", dir.path().join("no-bus").display());
        let snapper = DbusSnapper::with_address(address);

        let fault = snapper.list_configs().await.unwrap_err();
        assert_eq!(fault.code, ServiceFault::UNKNOWN);
    }
}
