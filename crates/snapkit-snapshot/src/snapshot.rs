//! Snapshot data structures.

use crate::service::RawSnapshot;
use crate::users::UserResolver;
use crate::{SnapshotError, SnapshotResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Date value the service uses for "no date recorded".
const UNSET_DATE: i64 = -1;

/// Kind of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Single,
    Pre,
    Post,
}

impl SnapshotKind {
    /// Map the service's type index onto a kind.
    pub fn from_index(index: u16) -> Option<Self> {
        match index {
            0 => Some(Self::Single),
            1 => Some(Self::Pre),
            2 => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "pre" => Ok(Self::Pre),
            "post" => Ok(Self::Post),
            other => Err(SnapshotError::validation(format!(
                "Invalid snapshot type '{other}'"
            ))),
        }
    }
}

/// Retention policy the service applies to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CleanupAlgorithm {
    /// Delete old snapshots once a count is reached.
    #[default]
    #[serde(rename = "number")]
    Number,
    /// Keep hourly/daily/weekly/monthly/yearly snapshots.
    #[serde(rename = "timeline")]
    Timeline,
    /// Delete pre/post pairs with empty diffs.
    #[serde(rename = "empty-pre-post")]
    EmptyPrePost,
    /// No cleanup.
    #[serde(rename = "")]
    None,
}

impl CleanupAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Timeline => "timeline",
            Self::EmptyPrePost => "empty-pre-post",
            Self::None => "",
        }
    }
}

impl fmt::Display for CleanupAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupAlgorithm {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(Self::Number),
            "timeline" => Ok(Self::Timeline),
            "empty-pre-post" => Ok(Self::EmptyPrePost),
            "" => Ok(Self::None),
            other => Err(SnapshotError::decode(format!(
                "unknown cleanup algorithm '{other}'"
            ))),
        }
    }
}

/// A point-in-time image of a configuration's subvolume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot number, unique within its configuration.
    pub id: u32,

    #[serde(rename = "type")]
    pub kind: SnapshotKind,

    /// Number of the paired pre snapshot. Only set for post snapshots.
    #[serde(rename = "pre", skip_serializing_if = "Option::is_none")]
    pub pre_id: Option<u32>,

    /// Creation time. When the service has no date this is the decode time.
    pub timestamp: DateTime<Utc>,

    /// Account name of the creator.
    pub user: String,

    pub description: String,

    #[serde(rename = "cleanup")]
    pub cleanup: CleanupAlgorithm,

    pub userdata: BTreeMap<String, String>,
}

impl Snapshot {
    /// Decode a raw service record.
    pub fn from_raw(raw: RawSnapshot, users: &dyn UserResolver) -> SnapshotResult<Self> {
        let RawSnapshot(id, type_index, pre, date, uid, description, cleanup, userdata) = raw;

        let kind = SnapshotKind::from_index(type_index).ok_or_else(|| {
            SnapshotError::decode(format!("snapshot {id} has unknown type index {type_index}"))
        })?;

        let pre_id = (kind == SnapshotKind::Post).then_some(pre);

        let timestamp = if date == UNSET_DATE {
            Utc::now()
        } else {
            Utc.timestamp_opt(date, 0).single().ok_or_else(|| {
                SnapshotError::decode(format!("snapshot {id} has invalid date {date}"))
            })?
        };

        let user = users
            .user_name(uid)
            .ok_or(SnapshotError::UnknownUser(uid))?;

        Ok(Self {
            id,
            kind,
            pre_id,
            timestamp,
            user,
            description,
            cleanup: cleanup.parse()?,
            userdata,
        })
    }

    /// Value of a userdata key, if present.
    pub fn userdata_value(&self, key: &str) -> Option<&str> {
        self.userdata.get(key).map(String::as_str)
    }
}

/// Parameters for creating a snapshot.
#[derive(Debug, Clone)]
pub struct CreateSnapshot {
    pub kind: SnapshotKind,
    /// Required for post snapshots.
    pub pre_id: Option<u32>,
    pub description: Option<String>,
    pub cleanup: CleanupAlgorithm,
    pub userdata: BTreeMap<String, String>,
    /// Identifier of the job this snapshot belongs to.
    pub job_id: Option<String>,
}

impl CreateSnapshot {
    /// Start describing a snapshot of the given kind.
    pub fn new(kind: SnapshotKind) -> Self {
        Self {
            kind,
            pre_id: None,
            description: None,
            cleanup: CleanupAlgorithm::default(),
            userdata: BTreeMap::new(),
            job_id: None,
        }
    }

    pub fn with_pre_id(mut self, pre_id: u32) -> Self {
        self.pre_id = Some(pre_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupAlgorithm) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_userdata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.userdata.insert(key.into(), value.into());
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Description to send, falling back to a job label.
    pub(crate) fn effective_description(&self) -> String {
        match (&self.description, &self.job_id) {
            (Some(description), _) => description.clone(),
            (None, Some(job_id)) => format!("job {job_id}"),
            (None, None) => String::new(),
        }
    }

    /// Userdata to send: a fresh copy with the job tag added.
    pub(crate) fn effective_userdata(&self, job_key: &str) -> BTreeMap<String, String> {
        let mut userdata = self.userdata.clone();
        if let Some(job_id) = &self.job_id {
            userdata.insert(job_key.to_string(), job_id.clone());
        }
        userdata
    }
}
