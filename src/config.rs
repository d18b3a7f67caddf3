//! Configuration types for modwatch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default quiet period: a file is stable once its size has not changed for this long
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Default total time to wait for a file to stabilize before giving up
pub const DEFAULT_STABILITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between size probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The four directories the pipeline operates on
///
/// All four are created (idempotently, parents included) before each pipeline
/// operation. The filesystem layout under these directories is the only
/// durable state the system keeps.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Directory externally populated with newly downloaded mod files (default: "./staging")
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Directory the game loads mods from; install target (default: "./mods")
    #[serde(default = "default_mods_dir")]
    pub mods_dir: PathBuf,

    /// Bucket for successfully installed source files (default: "./archive")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Bucket for source files whose install failed (default: "./failed")
    #[serde(default = "default_failed_dir")]
    pub failed_dir: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            mods_dir: default_mods_dir(),
            archive_dir: default_archive_dir(),
            failed_dir: default_failed_dir(),
        }
    }
}

impl DirectoriesConfig {
    /// Create all four directories, parents included
    ///
    /// Idempotent; called before every pipeline operation so a bucket deleted
    /// out from under a running watcher is recreated on the next file.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.staging_dir,
            &self.mods_dir,
            &self.archive_dir,
            &self.failed_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Timing knobs for the stability probe
///
/// Kept as a separate sub-config so tests can shrink the windows instead of
/// waiting out the production 60 second timeout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// How long a file's size must remain unchanged to count as stable (default: 2s)
    #[serde(default = "default_quiet_period")]
    pub quiet_period: Duration,

    /// Total time to wait for stability before reporting a timeout (default: 60s)
    #[serde(default = "default_stability_timeout")]
    pub timeout: Duration,

    /// Delay between size probes; must be non-zero (default: 250ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            quiet_period: default_quiet_period(),
            timeout: default_stability_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Top-level modwatch configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Staging/mods/archive/failed directory paths
    #[serde(default)]
    pub directories: DirectoriesConfig,

    /// Stability probe timing
    #[serde(default)]
    pub stability: StabilityConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults, so a partial config file
    /// (for example one that only sets `staging_dir` and `mods_dir`) is valid.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.stability.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be greater than zero".to_string(),
                key: Some("stability.poll_interval".to_string()),
            });
        }
        if self.stability.quiet_period > self.stability.timeout {
            return Err(Error::Config {
                message: "quiet_period cannot exceed timeout".to_string(),
                key: Some("stability.quiet_period".to_string()),
            });
        }
        Ok(())
    }
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./staging")
}

fn default_mods_dir() -> PathBuf {
    PathBuf::from("./mods")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./archive")
}

fn default_failed_dir() -> PathBuf {
    PathBuf::from("./failed")
}

fn default_quiet_period() -> Duration {
    DEFAULT_QUIET_PERIOD
}

fn default_stability_timeout() -> Duration {
    DEFAULT_STABILITY_TIMEOUT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}
