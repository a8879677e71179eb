//! Temp-file sweeper.
//!
//! Partial downloads and pending overwrites are written with marker
//! suffixes; anything carrying one is disposable at any time. The sweeper
//! runs at the start of every update run and again after each extraction
//! attempt, so a crashed run never accumulates artifacts.

use std::path::Path;
use walkdir::WalkDir;

/// Delete every file under `root` whose name ends (case-insensitively) with
/// one of the marker extensions. Returns the number of files removed.
///
/// Individual deletion failures are swallowed: a locked temp file is a
/// cosmetic nuisance, not a correctness hazard, and gets swept again on the
/// next run.
pub fn sweep(root: &Path, marker_extensions: &[String]) -> usize {
    let markers: Vec<String> = marker_extensions
        .iter()
        .map(|m| m.to_lowercase())
        .collect();

    let mut removed = 0;
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !markers.iter().any(|m| name.ends_with(m)) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), "removed temp artifact");
                removed += 1;
            }
            Err(e) => {
                tracing::debug!(path = %entry.path().display(), error = %e, "leaving temp artifact");
            }
        }
    }
    removed
}
