//! modwatch binary: thin CLI over the watch pipeline
//!
//! Gathers the four directory paths (config file plus flag overrides), sets
//! up logging, runs the reconciliation pass, and then either exits (`--once`)
//! or watches the staging directory until SIGINT/SIGTERM.

use clap::Parser;
use modwatch::{Config, StagingWatcher, run_until_shutdown};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Watch a staging folder and install downloaded mods
#[derive(Debug, Parser)]
#[command(name = "modwatch", version, about)]
struct Cli {
    /// Path to JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder to watch for downloaded mods (overrides config)
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Mods folder to install into (overrides config)
    #[arg(long)]
    mods_dir: Option<PathBuf>,

    /// Bucket for successfully installed files (overrides config)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Bucket for files whose install failed (overrides config)
    #[arg(long)]
    failed_dir: Option<PathBuf>,

    /// Process existing files in the staging dir and exit (no watching)
    #[arg(long)]
    once: bool,
}

impl Cli {
    /// Resolve the effective configuration: file first, then flag overrides
    fn resolve_config(&self) -> modwatch::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.staging_dir {
            config.directories.staging_dir = dir.clone();
        }
        if let Some(dir) = &self.mods_dir {
            config.directories.mods_dir = dir.clone();
        }
        if let Some(dir) = &self.archive_dir {
            config.directories.archive_dir = dir.clone();
        }
        if let Some(dir) = &self.failed_dir {
            config.directories.failed_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Progress lines go to stdout, failures to stderr
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(|meta| *meta.level() > Level::ERROR));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() -> modwatch::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let mut watcher = StagingWatcher::new(config)?;
    watcher.config().directories.ensure_dirs()?;

    // Handle downloads that completed while we were not running
    watcher.process_existing().await?;

    if cli.once {
        return Ok(());
    }

    watcher.start()?;
    run_until_shutdown(watcher).await
}
