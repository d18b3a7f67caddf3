//! Staging directory watching and per-file pipeline orchestration
//!
//! This module feeds the install pipeline from two sources:
//! - a reconciliation pass over files already sitting in the staging
//!   directory (one-off usage, and downloads that completed while the
//!   watcher was down)
//! - a live, non-recursive filesystem watch for files created afterwards
//!
//! Both feed the same per-file handler. Files are processed one at a time in
//! arrival order; no two files are mid-pipeline concurrently, so staging and
//! mods state needs no locking. One file's failure never halts processing of
//! subsequent files.

use crate::archive::{InstallOutcome, archive_file};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::install::{install_file, is_interesting};
use crate::stability::wait_for_stable_size;
use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Watches the staging directory and runs each mod file through the
/// stability → install → archive pipeline
pub struct StagingWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Directory layout and stability timing
    config: Config,
}

impl StagingWatcher {
    /// Create a new staging watcher
    ///
    /// # Errors
    /// Returns error if the filesystem watcher cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::Watch(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            config,
        })
    }

    /// The directory layout and timing this watcher runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the staging directory with the filesystem watcher
    ///
    /// Creates the directory layout first, so watching a fresh configuration
    /// works without manual setup. Non-recursive: subdirectories of staging
    /// are not monitored.
    ///
    /// # Errors
    /// Returns error if the staging directory cannot be created or watched
    pub fn start(&mut self) -> Result<()> {
        self.config.directories.ensure_dirs()?;

        self.watcher
            .watch(&self.config.directories.staging_dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(format!("failed to watch staging directory: {e}")))?;

        info!(
            staging = %self.config.directories.staging_dir.display(),
            mods = %self.config.directories.mods_dir.display(),
            "watching staging directory"
        );
        Ok(())
    }

    /// Process mod files already present in the staging directory
    ///
    /// Handles one-off usage and downloads that completed while the watcher
    /// was down. Entries are sorted for deterministic ordering and processed
    /// sequentially. Running this against an empty (or missing) staging
    /// directory is a no-op.
    ///
    /// # Errors
    /// Returns error only if the staging directory itself cannot be listed;
    /// individual file failures are routed to the failed bucket instead.
    pub async fn process_existing(&self) -> Result<()> {
        let staging = &self.config.directories.staging_dir;
        if !staging.exists() {
            return Ok(());
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(staging)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        for path in entries {
            if !is_interesting(&path) {
                continue;
            }
            info!(file = %display_name(&path), "found existing mod file");
            self.handle_file(&path).await;
        }

        Ok(())
    }

    /// Run the live watch event loop until cancelled
    ///
    /// Processes creation events from the staging directory as they arrive.
    /// Watcher transport errors are logged and the loop continues. Returns
    /// once `cancel` fires or the event channel closes; a file mid-probe at
    /// cancellation is left untouched in staging for the next reconciliation
    /// pass.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("staging watcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested, stopping staging watcher");
                    break;
                }
                maybe = self.rx.recv() => {
                    match maybe {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => {
                            error!(error = %e, "filesystem watcher error");
                        }
                        None => break,
                    }
                }
            }
        }

        info!("staging watcher stopped");
    }

    /// Handle a filesystem event
    ///
    /// Creation events and renames into the directory both count as arrivals;
    /// download tools typically write `mod.jar.part` and rename it to
    /// `mod.jar` when done, which surfaces as a rename, not a create.
    async fn handle_event(&self, event: Event) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => {
                for path in event.paths {
                    if is_interesting(&path) {
                        info!(file = %display_name(&path), "detected mod file");
                        self.handle_file(&path).await;
                    }
                }
            }
            _ => {
                // Ignore other event types (delete, access, data writes, etc.)
            }
        }
    }

    /// Run one staging file through the full pipeline
    ///
    /// Stability probe, install, then archive into the success or failure
    /// bucket. Install errors become a failure outcome with the captured
    /// reason; a secondary error while archiving is logged and the file is
    /// left in staging for the next reconciliation pass. This method never
    /// propagates an error, so the watch loop cannot be killed by one file.
    pub async fn handle_file(&self, path: &Path) {
        if let Err(e) = self.config.directories.ensure_dirs() {
            // Without the buckets there is nowhere to route the file; leave
            // it in staging and let the next pass retry.
            error!(file = %display_name(path), error = %e, "failed to create pipeline directories");
            return;
        }

        let outcome = match self.probe_and_install(path).await {
            Ok(()) => {
                info!(file = %display_name(path), "installed");
                InstallOutcome::Success
            }
            Err(Error::FileVanished { path: vanished }) => {
                // Nothing left to install or archive
                warn!(file = %display_name(&vanished), "file vanished before install");
                return;
            }
            Err(e) => {
                error!(file = %display_name(path), error = %e, "install failed");
                InstallOutcome::Failure {
                    reason: format!("{}: {}", e.kind(), e),
                }
            }
        };

        match archive_file(path, &outcome, &self.config.directories) {
            Ok(dest) => {
                debug!(file = %display_name(path), dest = %dest.display(), "archived");
            }
            Err(e) => {
                error!(
                    file = %display_name(path),
                    error = %e,
                    "failed to archive processed file, leaving it in staging"
                );
            }
        }
    }

    /// Wait for the file to stabilize, then install it into the mods directory
    async fn probe_and_install(&self, path: &Path) -> Result<()> {
        wait_for_stable_size(path, &self.config.stability).await?;
        install_file(path, &self.config.directories.mods_dir)
    }
}

/// File name for log lines, falling back to the full path display
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
