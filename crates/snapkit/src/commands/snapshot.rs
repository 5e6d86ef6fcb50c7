//! Snapshot listing, creation and command bracketing.

use super::{parse_assignment, Context};
use anyhow::{bail, Context as _, Result};
use snapkit_snapshot::{CleanupAlgorithm, CreateSnapshot, Snapshot, SnapshotKind};
use tokio::process::Command;
use tracing::info;

/// Options shared by `create` and `run`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SnapshotOptions {
    /// Snapshot description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Cleanup algorithm (number, timeline, empty-pre-post, or empty for none)
    #[arg(long, default_value = "number")]
    pub cleanup: String,
    /// Userdata entry, KEY=VALUE (repeatable)
    #[arg(short, long = "userdata", value_name = "KEY=VALUE")]
    pub userdata: Vec<String>,
    /// Job identifier to tag the snapshot with
    #[arg(short, long)]
    pub job: Option<String>,
}

impl SnapshotOptions {
    /// Build a creation request of the given kind.
    pub fn request(&self, kind: SnapshotKind) -> Result<CreateSnapshot> {
        let cleanup: CleanupAlgorithm = self.cleanup.parse()?;
        let mut request = CreateSnapshot::new(kind).with_cleanup(cleanup);
        if let Some(description) = &self.description {
            request = request.with_description(description.clone());
        }
        if let Some(job) = &self.job {
            request = request.with_job_id(job.clone());
        }
        for entry in &self.userdata {
            let (key, value) = parse_assignment(entry)?;
            request = request.with_userdata(key, value);
        }
        Ok(request)
    }
}

/// List all snapshots of the configuration.
pub async fn handle_list(ctx: &Context) -> Result<()> {
    let snapshots = ctx.snapper.list_snapshots(&ctx.config).await?;
    ctx.emit(&snapshots, |snapshots| {
        if snapshots.is_empty() {
            println!("No snapshots found.");
            return;
        }
        println!(
            "{:<6} {:<7} {:<6} {:<20} {:<10} DESCRIPTION",
            "ID", "TYPE", "PRE", "DATE", "USER"
        );
        println!("{}", "-".repeat(72));
        for snapshot in snapshots {
            print_row(snapshot);
        }
    })
}

/// Show one snapshot.
pub async fn handle_get(ctx: &Context, id: u32) -> Result<()> {
    let snapshot = ctx.snapper.get_snapshot(&ctx.config, id).await?;
    ctx.emit(&snapshot, |snapshot| {
        println!("Snapshot: {}", snapshot.id);
        println!("Type: {}", snapshot.kind);
        if let Some(pre) = snapshot.pre_id {
            println!("Pre: {pre}");
        }
        println!("Date: {}", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("User: {}", snapshot.user);
        println!("Description: {}", snapshot.description);
        println!("Cleanup: {}", snapshot.cleanup.as_str());
        for (key, value) in &snapshot.userdata {
            println!("Userdata: {key}={value}");
        }
    })
}

/// Create a single, pre or post snapshot.
pub async fn handle_create(
    ctx: &Context,
    kind: &str,
    pre: Option<u32>,
    options: &SnapshotOptions,
) -> Result<()> {
    let kind: SnapshotKind = kind.parse()?;
    let mut request = options.request(kind)?;
    if let Some(pre) = pre {
        request = request.with_pre_id(pre);
    }
    let id = ctx.snapper.create_snapshot(&ctx.config, &request).await?;
    ctx.emit(&serde_json::json!({ "id": id }), |_| println!("{id}"))
}

/// Run a command between a pre and a post snapshot and exit with its status.
pub async fn handle_run(
    ctx: &Context,
    options: &SnapshotOptions,
    command: &[String],
) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("No command given");
    };
    let template = options.request(SnapshotKind::Pre)?;

    let (interval, status) = ctx
        .snapper
        .run(&ctx.config, &template, || async {
            Command::new(program).args(args).status().await
        })
        .await?;
    let status = status.with_context(|| format!("Failed to run {program}"))?;
    info!(interval = %interval, status = ?status.code(), "Command finished");

    let code = status.code().unwrap_or(1);
    ctx.emit(
        &serde_json::json!({ "pre": interval.pre, "post": interval.post, "status": code }),
        |_| eprintln!("Snapshots {interval}"),
    )?;

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn print_row(snapshot: &Snapshot) {
    let pre = snapshot
        .pre_id
        .map(|pre| pre.to_string())
        .unwrap_or_default();
    println!(
        "{:<6} {:<7} {:<6} {:<20} {:<10} {}",
        snapshot.id,
        snapshot.kind.as_str(),
        pre,
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        snapshot.user,
        snapshot.description
    );
}
