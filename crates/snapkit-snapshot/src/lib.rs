//! Snapper snapshot comparison, diff and undo.
//!
//! This crate talks to the snapper daemon and provides:
//! - Listing and creating snapshots, including pre/post pairs around a job
//! - Per-file change status between two snapshots or a snapshot and the live system
//! - Unified diffs of changed text files
//! - Reverting changed files to an earlier snapshot
//! - Finding the snapshot pair a job created
//!
//! # Example
//!
//! ```no_run
//! use snapkit_snapshot::{DbusSnapper, Snapper, SnapperUndo};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let snapper = Snapper::new(Arc::new(DbusSnapper::system()));
//!
//! // What changed since the newest snapshot?
//! let status = snapper.status("root", None, None).await?;
//! for (path, change) in &status {
//!     println!("{change} {path}");
//! }
//!
//! // Show and revert the changes a job made
//! let diffs = snapper.diff_job("20160607130930720112", "root").await?;
//! let summary = snapper
//!     .undo_job(&SnapperUndo::default(), "20160607130930720112", "root")
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod compare;
mod config;
mod dbus;
mod diff;
mod error;
mod interval;
mod job;
mod mount;
mod service;
mod snapshot;
mod undo;
mod users;

#[cfg(test)]
mod testing;

pub use client::{Snapper, DEFAULT_JOB_KEY};
pub use compare::{ChangeSet, ChangeStatus};
pub use config::{service_settings, ConfigValue};
pub use dbus::DbusSnapper;
pub use diff::FileDiffs;
pub use error::{ServiceFault, SnapshotError, SnapshotResult};
pub use interval::ComparisonInterval;
pub use mount::MountRegistry;
pub use service::{ConfigInfo, RawFile, RawSnapshot, ServiceResult, SnapperService};
pub use snapshot::{CleanupAlgorithm, CreateSnapshot, Snapshot, SnapshotKind};
pub use undo::{parse_undo_output, SnapperUndo, UndoExecutor, UndoSummary};
pub use users::{SystemUsers, UserResolver};
