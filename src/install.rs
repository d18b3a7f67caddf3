//! Mod installation: single-file copy and safe archive extraction
//!
//! A stabilized staging file is installed into the mods directory in one of
//! two ways depending on its extension:
//! - `.jar` files are copied byte-for-byte under their original name, with a
//!   timestamp inserted on name collision
//! - `.zip` bundles are extracted preserving their internal directory
//!   structure, after every entry path has been vetted against zip-slip
//!
//! Anything else is ignored by this stage; the event source filters
//! non-interesting files before they reach the pipeline.

use crate::error::{Error, Result};
use crate::utils::stamped_unique_path;
use std::path::Path;
use tracing::{debug, info};

/// Partial-download markers left by browsers and download managers
const IGNORE_SUFFIXES: &[&str] = &[".part", ".tmp", ".crdownload"];

/// How a staging file is installed into the mods directory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModFileKind {
    /// A packaged mod unit copied into the mods directory as-is (`.jar`)
    SingleFile,
    /// A zip-family container extracted into the mods directory (`.zip`)
    Bundle,
}

/// Classify a path by its extension (case-insensitive)
///
/// Returns `None` for anything that is not a recognized mod package.
pub fn classify(path: &Path) -> Option<ModFileKind> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("jar") {
        Some(ModFileKind::SingleFile)
    } else if ext.eq_ignore_ascii_case("zip") {
        Some(ModFileKind::Bundle)
    } else {
        None
    }
}

/// Whether a staging entry should enter the pipeline
///
/// True only for regular files whose name does not carry a partial-download
/// suffix and whose extension is a recognized mod package kind.
pub fn is_interesting(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    if IGNORE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return false;
    }
    classify(path).is_some()
}

/// Install a stabilized staging file into the mods directory
///
/// Dispatches on [`classify`]; unrecognized extensions are a no-op. The
/// source file is left in place — archiving it out of staging is the
/// caller's final step, and only runs after this returns.
///
/// # Errors
/// * [`Error::UnsafeArchive`] / [`Error::CorruptArchive`] from bundle extraction
/// * [`Error::Io`] for copy or filesystem failures
pub fn install_file(path: &Path, mods_dir: &Path) -> Result<()> {
    match classify(path) {
        Some(ModFileKind::SingleFile) => {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::Io(std::io::Error::other("file has no UTF-8 name")))?;
            let target = stamped_unique_path(mods_dir, name);
            std::fs::copy(path, &target)?;
            info!(source = %path.display(), target = %target.display(), "installed mod file");
            Ok(())
        }
        Some(ModFileKind::Bundle) => {
            safe_extract_zip(path, mods_dir)?;
            info!(source = %path.display(), dest = %mods_dir.display(), "extracted mod bundle");
            Ok(())
        }
        None => {
            debug!(path = %path.display(), "ignoring file with unrecognized extension");
            Ok(())
        }
    }
}

/// Extract a zip bundle into `dest_dir`, preserving internal structure
///
/// All entry paths are validated before anything is written: if any entry is
/// absolute or contains a parent-directory segment, the whole extraction is
/// rejected and the mods directory is left untouched.
pub fn safe_extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::CorruptArchive {
        archive: zip_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    // Vet every entry before writing a single byte
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| Error::CorruptArchive {
            archive: zip_path.to_path_buf(),
            reason: format!("failed to read entry {index}: {e}"),
        })?;
        let name = entry.name();
        if is_escaping_path(name) {
            return Err(Error::UnsafeArchive {
                archive: zip_path.to_path_buf(),
                entry: name.to_string(),
            });
        }
    }

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| Error::CorruptArchive {
            archive: zip_path.to_path_buf(),
            reason: format!("failed to read entry {index}: {e}"),
        })?;

        // Already vetted above; enclosed_name re-checks as a belt
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(Error::UnsafeArchive {
                archive: zip_path.to_path_buf(),
                entry: entry.name().to_string(),
            });
        };
        let target = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Error::CorruptArchive {
            archive: zip_path.to_path_buf(),
            reason: format!("failed to extract {}: {}", entry.name(), e),
        })?;
        debug!(entry = entry.name(), target = %target.display(), "extracted entry");
    }

    Ok(())
}

/// Whether an archive entry path escapes the extraction root
fn is_escaping_path(name: &str) -> bool {
    let path = Path::new(name);
    if path.is_absolute() || name.starts_with('/') || name.starts_with('\\') {
        return true;
    }
    path.components().any(|c| {
        matches!(
            c,
            std::path::Component::ParentDir | std::path::Component::Prefix(_)
        )
    })
}
