//! Staged extractor.
//!
//! Extracts a downloaded archive into the installation tree. Entries that
//! live directly under the reserved updater directory are redirected into
//! the staging directory instead, because the updater cannot overwrite the
//! bytes backing its own running image; a bootstrap step swaps them in on
//! the next launch. Extraction is forward-only: on error it stops where it
//! is, sweeps, and reports — it never rolls back files already written.

use crate::archive::ArchiveOpener;
use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::sweeper;
use std::path::Path;

/// Extracts archives into the live tree with reserved-directory staging.
pub struct StagedExtractor {
    config: UpdaterConfig,
    opener: Box<dyn ArchiveOpener>,
}

impl StagedExtractor {
    pub fn new(config: UpdaterConfig, opener: Box<dyn ArchiveOpener>) -> Self {
        Self { config, opener }
    }

    /// Extract every entry of the archive at `archive_path`.
    ///
    /// Regular entries land under the install root, reserved-directory
    /// entries under the staging directory. Existing files are overwritten
    /// silently. The sweeper runs after extraction on both the success and
    /// the failure path, after the archive handle has been released.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::ExtractionFailed`] carrying the archive path,
    /// so the caller can tell the user where to extract manually.
    pub fn extract_archive(&self, archive_path: &Path) -> Result<()> {
        tracing::info!(archive = %archive_path.display(), "extracting");

        // The reader is scoped to this call: it is dropped (and the archive
        // handle released) before the sweeper runs, whatever the outcome.
        let outcome = self.extract_entries(archive_path);

        let swept = sweeper::sweep(&self.config.install_root, &self.config.marker_extensions);
        if swept > 0 {
            tracing::debug!(swept, "post-extraction sweep");
        }

        outcome.map_err(|e| match e {
            already @ UpdateError::ExtractionFailed { .. } => already,
            other => {
                let access_denied = matches!(
                    &other,
                    UpdateError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied
                );
                UpdateError::ExtractionFailed {
                    archive: archive_path.to_path_buf(),
                    reason: other.to_string(),
                    access_denied,
                }
            }
        })
    }

    fn extract_entries(&self, archive_path: &Path) -> Result<()> {
        let mut reader = self.opener.open(archive_path)?;
        let entries = reader.entries()?;
        let staging = self.config.staging_path();

        for entry in &entries {
            if entry.is_dir {
                continue;
            }
            let target = if entry.is_under(&self.config.reserved_dir) {
                &staging
            } else {
                &self.config.install_root
            };
            reader.extract(entry, target)?;
        }
        Ok(())
    }
}
