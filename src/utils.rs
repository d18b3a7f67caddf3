//! Utility functions for collision-safe destination naming

use chrono::Local;
use std::path::{Path, PathBuf};

/// Timestamp format inserted between stem and extension on name collisions
const COLLISION_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Resolve a destination path inside `dir` for `file_name`, avoiding overwrite
///
/// If `dir/file_name` does not exist it is returned unchanged. If it does, a
/// second-resolution timestamp is inserted between the base name and the
/// extension, e.g. `mod.jar` becomes `mod-20260829-141503.jar`.
///
/// Known limitation: two collisions within the same second produce the same
/// stamped name, so the second write overwrites the first. The stamp exists
/// to avoid the common overwrite case, not to guarantee uniqueness.
pub fn stamped_unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let stamp = Local::now().format(COLLISION_STAMP_FORMAT);

    let stamped = match name.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{stamp}.{ext}"),
        None => format!("{stem}-{stamp}"),
    };
    dir.join(stamped)
}
