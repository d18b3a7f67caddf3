//! # modwatch
//!
//! Watches a staging directory for newly downloaded mod archives, waits for
//! each download to finish, installs it into a mods directory, and archives
//! the original into a success or failure bucket.
//!
//! ## Design Philosophy
//!
//! - **The filesystem is the state** - no database; staging, mods, archive
//!   and failed directories are the only durable state
//! - **One file at a time** - a single logical worker, no locking needed
//! - **Failures are routed, not fatal** - a bad archive lands in the failed
//!   bucket with a reason log; the watch loop keeps running
//!
//! ## Quick Start
//!
//! ```no_run
//! use modwatch::{Config, StagingWatcher, run_until_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     let mut watcher = StagingWatcher::new(config)?;
//!
//!     // Install anything already waiting in staging
//!     watcher.process_existing().await?;
//!
//!     // Then watch live until SIGINT/SIGTERM
//!     watcher.start()?;
//!     run_until_shutdown(watcher).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Outcome archiving into success/failure buckets
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Mod installation and safe archive extraction
pub mod install;
/// Download stability detection
pub mod stability;
/// Collision-safe destination naming
pub mod utils;
/// Staging directory watching and pipeline orchestration
pub mod watcher;

// Re-export commonly used types
pub use archive::{FAILURE_LOG_SUFFIX, InstallOutcome, archive_file};
pub use config::{Config, DirectoriesConfig, StabilityConfig};
pub use error::{Error, Result};
pub use install::{ModFileKind, classify, install_file, is_interesting, safe_extract_zip};
pub use stability::wait_for_stable_size;
pub use watcher::StagingWatcher;

use tokio_util::sync::CancellationToken;

/// Run the live watch until a termination signal arrives, then stop it
/// gracefully.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// A file mid-probe when the signal arrives is left untouched in staging and
/// is picked up by the reconciliation pass on next startup.
pub async fn run_until_shutdown(watcher: StagingWatcher) -> Result<()> {
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(watcher.run(loop_cancel));

    wait_for_signal().await;
    cancel.cancel();

    handle
        .await
        .map_err(|e| Error::Watch(format!("watch loop task panicked: {e}")))
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        _ => {
            tracing::warn!("could not register unix signal handlers, falling back to ctrl_c");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C signal");
    }
}
