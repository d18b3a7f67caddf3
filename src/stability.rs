//! Download stability detection
//!
//! Downloads arrive via external tools that write incrementally, so a file's
//! presence in the staging directory does not mean it is complete. The probe
//! in this module polls the file's size and declares it stable once the size
//! has stopped changing for a quiet period, avoiding installs of truncated
//! archives. The timing windows come from [`StabilityConfig`] so tests can
//! shrink them.

use crate::config::StabilityConfig;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Wait until the file's size has not changed for the configured quiet period
///
/// Polls `path` every `config.poll_interval`. Tracks the last observed size
/// and the timestamp of its last change; once `quiet_period` elapses without
/// a change the file is considered stable.
///
/// # Errors
/// * [`Error::StabilityTimeout`] if `config.timeout` elapses before the size settles
/// * [`Error::FileVanished`] if the file disappears mid-check
/// * [`Error::Io`] for any other filesystem error while probing
pub async fn wait_for_stable_size(path: &Path, config: &StabilityConfig) -> Result<()> {
    let start = Instant::now();
    let mut last_size: Option<u64> = None;
    let mut last_change = start;

    debug!(path = %path.display(), "waiting for download to stabilize");

    while start.elapsed() < config.timeout {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::FileVanished {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if last_size != Some(size) {
            trace!(path = %path.display(), size, "size changed");
            last_size = Some(size);
            last_change = Instant::now();
        } else if last_change.elapsed() >= config.quiet_period {
            debug!(
                path = %path.display(),
                size,
                settled_after = ?start.elapsed(),
                "download stable"
            );
            return Ok(());
        }

        tokio::time::sleep(config.poll_interval).await;
    }

    Err(Error::StabilityTimeout {
        path: path.to_path_buf(),
        waited: start.elapsed(),
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Shrunk timing windows so tests finish in well under a second
    fn fast_config() -> StabilityConfig {
        StabilityConfig {
            quiet_period: Duration::from_millis(80),
            timeout: Duration::from_millis(600),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_already_stable_file_settles_after_quiet_period() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mod.jar");
        std::fs::write(&path, b"finished download").unwrap();

        let config = fast_config();
        let start = std::time::Instant::now();
        wait_for_stable_size(&path, &config).await.unwrap();
        let elapsed = start.elapsed();

        // Success cannot be declared before the quiet period has elapsed
        assert!(elapsed >= config.quiet_period, "settled too early: {elapsed:?}");
        assert!(elapsed < config.timeout, "took too long: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_growing_file_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mod.zip");
        std::fs::write(&path, b"").unwrap();

        let config = fast_config();
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            // Keep appending faster than the quiet period for longer than the timeout
            for i in 0u32..40 {
                let mut contents = std::fs::read(&writer_path).unwrap_or_default();
                contents.extend_from_slice(format!("chunk{i}").as_bytes());
                std::fs::write(&writer_path, &contents).unwrap();
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        });

        let err = wait_for_stable_size(&path, &config).await.unwrap_err();
        writer.abort();

        match err {
            Error::StabilityTimeout { path: p, waited } => {
                assert_eq!(p, path);
                assert!(waited >= config.timeout);
            }
            other => panic!("expected StabilityTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_settles_once_growth_stops() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mod.jar");
        std::fs::write(&path, b"a").unwrap();

        let config = fast_config();
        let writer_path = path.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let mut contents = std::fs::read(&writer_path).unwrap_or_default();
                contents.push(b'b');
                std::fs::write(&writer_path, &contents).unwrap();
            }
            // Then stop writing; the probe should settle after the quiet period
        });

        wait_for_stable_size(&path, &config).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_reports_vanished() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.jar");

        let err = wait_for_stable_size(&path, &fast_config()).await.unwrap_err();
        assert!(matches!(err, Error::FileVanished { .. }));
    }

    #[tokio::test]
    async fn test_file_deleted_mid_probe_reports_vanished() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mod.jar");
        std::fs::write(&path, b"data").unwrap();

        let config = fast_config();
        let delete_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            std::fs::remove_file(&delete_path).unwrap();
        });

        let err = wait_for_stable_size(&path, &config).await.unwrap_err();
        assert!(matches!(err, Error::FileVanished { .. }));
    }
}
