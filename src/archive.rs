//! Outcome archiving: moving processed staging files into success/failure buckets
//!
//! The move out of staging is the last step of the pipeline for a file and
//! the only thing that removes it from the staging directory. Failures carry
//! a sidecar text log next to the moved file so the failed bucket is
//! self-describing.

use crate::config::DirectoriesConfig;
use crate::error::Result;
use crate::utils::stamped_unique_path;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix appended to a failed file's name for its sidecar reason log
pub const FAILURE_LOG_SUFFIX: &str = ".log.txt";

/// How processing a staging file ended
///
/// Drives which bucket the source file is archived into and whether a
/// sidecar reason log is written. Threaded explicitly through the per-file
/// handler so the failure path is testable without the live watch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The file was installed into the mods directory
    Success,
    /// Installation failed; the reason ends up in the sidecar log
    Failure {
        /// Human-readable description of what went wrong
        reason: String,
    },
}

impl InstallOutcome {
    /// Whether this outcome routes to the archive (success) bucket
    pub fn is_success(&self) -> bool {
        matches!(self, InstallOutcome::Success)
    }
}

/// Move a processed source file into its outcome bucket
///
/// Success routes to `archive_dir`, failure to `failed_dir`; name collisions
/// in the bucket get the same timestamp treatment as installs. On failure
/// with a non-empty reason, a sidecar `<moved name>.log.txt` is written next
/// to the moved file containing the reason and a trailing newline.
///
/// Returns the path the file was moved to.
pub fn archive_file(
    path: &Path,
    outcome: &InstallOutcome,
    dirs: &DirectoriesConfig,
) -> Result<PathBuf> {
    dirs.ensure_dirs()?;

    let bucket = if outcome.is_success() {
        &dirs.archive_dir
    } else {
        &dirs.failed_dir
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| std::io::Error::other("file has no UTF-8 name"))?;
    let dest = stamped_unique_path(bucket, name);

    move_file(path, &dest)?;
    info!(
        source = %path.display(),
        dest = %dest.display(),
        success = outcome.is_success(),
        "archived source file"
    );

    if let InstallOutcome::Failure { reason } = outcome {
        if !reason.is_empty() {
            let mut log_name = dest.file_name().unwrap_or_default().to_os_string();
            log_name.push(FAILURE_LOG_SUFFIX);
            let log_path = dest.with_file_name(log_name);
            std::fs::write(&log_path, format!("{reason}\n"))?;
            debug!(log = %log_path.display(), "wrote failure reason log");
        }
    }

    Ok(dest)
}

/// Move a file, falling back to copy+remove when rename fails (cross-device)
fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if std::fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    std::fs::copy(source, dest)?;
    std::fs::remove_file(source)?;
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn test_dirs(temp_dir: &TempDir) -> DirectoriesConfig {
        DirectoriesConfig {
            staging_dir: temp_dir.path().join("staging"),
            mods_dir: temp_dir.path().join("mods"),
            archive_dir: temp_dir.path().join("archive"),
            failed_dir: temp_dir.path().join("failed"),
        }
    }

    #[test]
    fn test_success_moves_into_archive_bucket() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        dirs.ensure_dirs().unwrap();
        let source = dirs.staging_dir.join("mod.jar");
        fs::write(&source, b"payload").unwrap();

        let dest = archive_file(&source, &InstallOutcome::Success, &dirs).unwrap();

        assert_eq!(dest, dirs.archive_dir.join("mod.jar"));
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        assert!(!source.exists(), "source must leave staging");
    }

    #[test]
    fn test_failure_moves_into_failed_bucket_with_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        dirs.ensure_dirs().unwrap();
        let source = dirs.staging_dir.join("bundle.zip");
        fs::write(&source, b"broken").unwrap();

        let outcome = InstallOutcome::Failure {
            reason: "unsafe path in archive: ../evil".to_string(),
        };
        let dest = archive_file(&source, &outcome, &dirs).unwrap();

        assert_eq!(dest, dirs.failed_dir.join("bundle.zip"));
        assert!(!source.exists());

        let log = dirs.failed_dir.join("bundle.zip.log.txt");
        let contents = fs::read_to_string(&log).unwrap();
        assert_eq!(contents, "unsafe path in archive: ../evil\n");
    }

    #[test]
    fn test_failure_with_empty_reason_writes_no_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        dirs.ensure_dirs().unwrap();
        let source = dirs.staging_dir.join("mod.jar");
        fs::write(&source, b"x").unwrap();

        let outcome = InstallOutcome::Failure {
            reason: String::new(),
        };
        archive_file(&source, &outcome, &dirs).unwrap();

        assert!(dirs.failed_dir.join("mod.jar").exists());
        assert!(!dirs.failed_dir.join("mod.jar.log.txt").exists());
    }

    #[test]
    fn test_success_never_writes_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        dirs.ensure_dirs().unwrap();
        let source = dirs.staging_dir.join("mod.jar");
        fs::write(&source, b"x").unwrap();

        archive_file(&source, &InstallOutcome::Success, &dirs).unwrap();
        assert!(!dirs.archive_dir.join("mod.jar.log.txt").exists());
    }

    #[test]
    fn test_bucket_collision_gets_timestamped_name() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        dirs.ensure_dirs().unwrap();
        fs::write(dirs.archive_dir.join("mod.jar"), b"previous run").unwrap();
        let source = dirs.staging_dir.join("mod.jar");
        fs::write(&source, b"this run").unwrap();

        let dest = archive_file(&source, &InstallOutcome::Success, &dirs).unwrap();

        assert_ne!(dest, dirs.archive_dir.join("mod.jar"));
        let name = dest.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("mod-") && name.ends_with(".jar"));
        assert_eq!(
            fs::read(dirs.archive_dir.join("mod.jar")).unwrap(),
            b"previous run"
        );
        assert_eq!(fs::read(&dest).unwrap(), b"this run");
    }

    #[test]
    fn test_missing_buckets_are_created_on_demand() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = test_dirs(&temp_dir);
        // Only staging exists up front
        fs::create_dir_all(&dirs.staging_dir).unwrap();
        let source = dirs.staging_dir.join("mod.jar");
        fs::write(&source, b"x").unwrap();

        archive_file(&source, &InstallOutcome::Success, &dirs).unwrap();
        assert!(dirs.archive_dir.join("mod.jar").exists());
    }
}
