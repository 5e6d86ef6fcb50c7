//! Snapkit - inspect, diff and undo snapper snapshots.
//!
//! This is the main entry point for the snapkit CLI.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use commands::*;
use settings::Settings;
use snapkit_snapshot::{DbusSnapper, Snapper, SnapperUndo};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "snapkit")]
#[command(author, version, about = "Inspect, diff and undo snapper snapshots", long_about = None)]
struct Cli {
    /// Snapper configuration to use
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List snapshots
    List,
    /// Show one snapshot
    Get {
        /// Snapshot number
        id: u32,
    },
    /// List configurations
    Configs,
    /// Show or change the selected configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Create a snapshot
    Create {
        /// Snapshot type (single, pre, post)
        #[arg(short = 't', long = "type", default_value = "single")]
        kind: String,
        /// Pre snapshot number, required for post snapshots
        #[arg(long)]
        pre: Option<u32>,
        #[command(flatten)]
        options: SnapshotOptions,
    },
    /// Run a command between a pre and a post snapshot
    Run {
        #[command(flatten)]
        options: SnapshotOptions,
        /// Command to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Show the change status of changed files
    Status {
        #[command(flatten)]
        interval: IntervalArgs,
    },
    /// List changed files
    Changed {
        #[command(flatten)]
        interval: IntervalArgs,
    },
    /// Show unified diffs of changed text files
    Diff {
        #[command(flatten)]
        interval: IntervalArgs,
        /// Limit the diff to one file
        file: Option<String>,
    },
    /// Revert changed files to the earlier snapshot
    Undo {
        #[command(flatten)]
        interval: IntervalArgs,
        /// Files to revert (all changed files if omitted)
        files: Vec<String>,
    },
    /// Show the snapshot pair a job created
    Job {
        /// Job identifier
        job_id: String,
    },
    /// Revert the changes a job made
    UndoJob {
        /// Job identifier
        job_id: String,
    },
    /// Show the changes a job made
    DiffJob {
        /// Job identifier
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load()?;
    init_logging(cli.verbose, &settings.log_level);
    debug!(?settings, "Settings loaded");

    let service = Arc::new(match &settings.bus_address {
        Some(address) => DbusSnapper::with_address(address.clone()),
        None => DbusSnapper::system(),
    });
    let ctx = Context {
        snapper: Snapper::new(service).with_job_key(settings.job_key.clone()),
        undo: SnapperUndo::new(settings.snapper.clone()),
        config: cli.config.unwrap_or(settings.default_config),
        json: cli.json,
    };

    match cli.command {
        Commands::List => handle_list(&ctx).await,
        Commands::Get { id } => handle_get(&ctx, id).await,
        Commands::Configs => handle_configs(&ctx).await,
        Commands::Config { command } => handle_config(&ctx, command).await,
        Commands::Create { kind, pre, options } => handle_create(&ctx, &kind, pre, &options).await,
        Commands::Run { options, command } => handle_run(&ctx, &options, &command).await,
        Commands::Status { interval } => handle_status(&ctx, interval).await,
        Commands::Changed { interval } => handle_changed(&ctx, interval).await,
        Commands::Diff { interval, file } => handle_diff(&ctx, interval, file.as_deref()).await,
        Commands::Undo { interval, files } => handle_undo(&ctx, interval, &files).await,
        Commands::Job { job_id } => handle_job(&ctx, &job_id).await,
        Commands::UndoJob { job_id } => handle_undo_job(&ctx, &job_id).await,
        Commands::DiffJob { job_id } => handle_diff_job(&ctx, &job_id).await,
    }
}
