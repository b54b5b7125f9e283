//! # DriveWatch CLI
//!
//! Watches cloud-storage folders and announces new files and folders in chat.
//!
//! Usage:
//!   drivewatch run                     # Scan + dispatch loops until Ctrl+C
//!   drivewatch run --dry-run           # Log notifications instead of posting
//!   drivewatch scan --source "Sofia"   # One pass over a single source
//!   drivewatch status                  # Dedup store counts and sources
//!   drivewatch config show             # Effective configuration (masked)

use anyhow::Result;
use clap::{Parser, Subcommand};
use drivewatch_core::config::{ChatBackend, DedupBackend};
use drivewatch_core::traits::{Channel, PendingQueue, StorageProvider, SystemClock};
use drivewatch_core::{DriveWatchConfig, DriveWatchError};
use drivewatch_scheduler::{DelayQueue, Notifier, SchedulerEngine};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "drivewatch",
    version,
    about = "📁 DriveWatch — new-upload notifications for cloud-storage folders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scan and dispatch loops until Ctrl+C
    Run {
        /// Log notifications instead of posting them; dedup stays in memory
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single pass and flush anything already due
    Scan {
        /// Only scan the named source
        #[arg(short, long)]
        source: Option<String>,

        /// Log notifications instead of posting them; dedup stays in memory
        #[arg(long)]
        dry_run: bool,
    },

    /// Show dedup store counts and configured sources
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration with secrets masked
    Show,
    /// Print the default config file path
    Path,
}

struct Runtime {
    engine: Arc<SchedulerEngine>,
    /// Queued notifications outlive the process.
    durable_queue: bool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Wire provider, channel, store and engine together.
/// Configuration problems come back as `DriveWatchError::Config`.
async fn build_runtime(config: &DriveWatchConfig) -> drivewatch_core::Result<Runtime> {
    config.validate()?;

    let timeout = config.scan.request_timeout();
    let provider: Arc<dyn StorageProvider> = Arc::from(drivewatch_providers::create_provider(config)?);

    let mut channel = drivewatch_channels::create_channel(&config.chat, timeout)?;
    channel.connect().await?;
    let channel: Arc<dyn Channel> = Arc::from(channel);

    let stores = drivewatch_memory::create_store(&config.dedup)?;
    let durable_queue = stores.pending.is_some();
    let queue: Arc<dyn PendingQueue> = match stores.pending {
        Some(queue) => queue,
        None => Arc::new(DelayQueue::new()),
    };
    let notifier = Notifier::new(channel, config.chat.channel_id.clone(), config.chat.mention_role_id.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = SchedulerEngine::new(
        provider,
        stores.seen,
        queue,
        notifier,
        Arc::new(SystemClock),
        config.sources.clone(),
    )
    .with_shutdown(shutdown_rx.clone());

    Ok(Runtime { engine: Arc::new(engine), durable_queue, shutdown_tx, shutdown_rx })
}

fn apply_dry_run(config: &mut DriveWatchConfig) {
    config.chat.backend = ChatBackend::Console;
    config.dedup.backend = DedupBackend::Memory;
}

/// Config errors stop the watcher from starting but are not a crash.
fn report_startup_error(e: DriveWatchError) -> Result<()> {
    match e {
        DriveWatchError::Config(_) | DriveWatchError::ConfigNotFound(_) => {
            tracing::error!("{e}; watcher not started");
            Ok(())
        }
        other => Err(other.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "drivewatch=debug,drivewatch_core=debug,drivewatch_scheduler=debug,drivewatch_providers=debug,drivewatch_channels=debug,drivewatch_memory=debug"
    } else {
        "drivewatch=info,drivewatch_scheduler=info,drivewatch_channels=info,drivewatch_memory=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config
    let loaded = if let Some(path) = &cli.config {
        DriveWatchConfig::load_from(std::path::Path::new(path))
    } else {
        DriveWatchConfig::load()
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => return report_startup_error(e),
    };

    match cli.command {
        Commands::Run { dry_run } => {
            if dry_run {
                apply_dry_run(&mut config);
            }
            let runtime = match build_runtime(&config).await {
                Ok(runtime) => runtime,
                Err(e) => return report_startup_error(e),
            };

            println!("📁 DriveWatch v{}", env!("CARGO_PKG_VERSION"));
            println!("   Sources:  {}", runtime.engine.sources().len());
            println!("   Scan:     every {}s", config.scan.interval_secs);
            println!("   Dispatch: every {}s", config.scan.dispatch_interval_secs);
            println!("\nWatching. Press Ctrl+C to stop.");

            let (scan, dispatch) = runtime.engine.clone().spawn(
                config.scan.interval(),
                config.scan.dispatch_interval(),
                runtime.shutdown_rx.clone(),
            );

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown requested");
            runtime.shutdown_tx.send(true).ok();
            let _ = tokio::join!(scan, dispatch);
            println!("\n👋 DriveWatch stopped.");
        }

        Commands::Scan { source, dry_run } => {
            if dry_run {
                apply_dry_run(&mut config);
            }
            if let Some(name) = &source {
                let Some(selected) = config.source(name).cloned() else {
                    anyhow::bail!("Unknown source: {name}");
                };
                config.sources = vec![selected];
            }
            let runtime = match build_runtime(&config).await {
                Ok(runtime) => runtime,
                Err(e) => return report_startup_error(e),
            };

            let report = runtime.engine.run_pass().await;
            let dispatched = runtime.engine.dispatch_due().await;

            println!("🔍 Scan complete");
            println!("   Sources:   {}", report.sources);
            println!("   Nodes:     {}", report.nodes);
            println!("   New:       {}", report.new_items);
            println!("   Sent:      {}", report.sent + dispatched.delivered);
            println!("   Delayed:   {}", report.queued);
            println!("   Dropped:   {}", report.dropped + dispatched.dropped);
            println!("   Failures:  {}", report.failures);
            if dispatched.still_pending > 0 {
                let next = dispatched.next_due
                    .map(|at| format!(", next due {}", at.to_rfc3339()))
                    .unwrap_or_default();
                if runtime.durable_queue {
                    println!(
                        "   ⏳ {} notifications stay queued for the next run{next}",
                        dispatched.still_pending
                    );
                } else {
                    println!(
                        "   ⚠️  {} notifications were still queued and are dropped on exit{next}; use `drivewatch run` or the sqlite backend for delayed sources",
                        dispatched.still_pending
                    );
                }
            }
        }

        Commands::Status => {
            let stores = drivewatch_memory::create_store(&config.dedup)?;
            let stats = stores.seen.stats().await?;
            println!("📊 DriveWatch status");
            println!("   Dedup backend:   {}", stores.seen.name());
            if config.dedup.backend == DedupBackend::Sqlite {
                println!("   Database:        {}", config.dedup.resolved_path().display());
            }
            println!("   Seen items:      {}", stats.seen_items);
            println!("   Scanned folders: {}", stats.scanned_folders);
            if let Some(pending) = &stores.pending {
                println!("   Queued:          {}", pending.count().await?);
                if let Some(next) = pending.next_due().await? {
                    println!("   Next due:        {}", next.to_rfc3339());
                }
            }
            println!("   Sources:");
            for source in &config.sources {
                let delay = source.delay()
                    .map(|d| format!(", delayed {}m", d.num_minutes()))
                    .unwrap_or_default();
                println!("     • {} [{}{}] {}", source.name, source.mode, delay, source.root_id);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", config.masked().to_toml()?);
            }
            ConfigAction::Path => {
                println!("{}", DriveWatchConfig::default_path().display());
            }
        },
    }

    Ok(())
}
