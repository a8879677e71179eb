//! Update orchestrator.
//!
//! Drives one update run end to end: sweep, fetch the pending releases,
//! then per release download, extract, and delete the archive. Any error
//! anywhere in that path aborts the run and falls back to opening the
//! latest-release page in the browser; there is no per-release partial
//! success and no differentiated retry. Re-running the tool from scratch is
//! always safe: the sweeper is idempotent and downloads overwrite their
//! deterministic names.

use crate::config::UpdaterConfig;
use crate::download::AssetDownloader;
use crate::error::{Result, UpdateError};
use crate::extractor::StagedExtractor;
use crate::release::ReleaseFeed;
use crate::sweeper;
use std::path::Path;
use std::process::Command;

/// How an update run ended. Whatever the outcome, the process exits with a
/// success status: its job is done either way.
#[derive(Debug)]
pub enum RunOutcome {
    /// No pending releases; nothing was downloaded or extracted.
    UpToDate,
    /// All pending releases applied and the application relaunched.
    Updated {
        /// Tags applied, in order.
        applied: Vec<String>,
    },
    /// The run aborted and the latest-release page was opened instead.
    Fallback {
        /// The error that aborted the run.
        error: UpdateError,
    },
}

/// Starts the updated application, or the browser on the fallback path.
pub trait Launcher {
    /// Launch the main application executable with no arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    fn launch_app(&self, executable: &Path) -> Result<()>;

    /// Open `url` in the user's default browser.
    ///
    /// # Errors
    ///
    /// Returns an error if no opener could be started.
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Production launcher shelling out to the platform's opener.
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch_app(&self, executable: &Path) -> Result<()> {
        Command::new(executable)
            .spawn()
            .map_err(|e| UpdateError::Launch(format!("cannot start {}: {e}", executable.display())))?;
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<()> {
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        };
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = Command::new("open");
            c.arg(url);
            c
        };
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let mut command = {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        };

        command
            .spawn()
            .map_err(|e| UpdateError::Launch(format!("cannot open {url}: {e}")))?;
        Ok(())
    }
}

/// Sequences one update run. Single-threaded by construction; network and
/// disk operations block the calling flow but never overlap each other.
pub struct Orchestrator {
    config: UpdaterConfig,
    feed: Box<dyn ReleaseFeed>,
    downloader: Box<dyn AssetDownloader>,
    extractor: StagedExtractor,
    launcher: Box<dyn Launcher>,
}

impl Orchestrator {
    pub fn new(
        config: UpdaterConfig,
        feed: Box<dyn ReleaseFeed>,
        downloader: Box<dyn AssetDownloader>,
        extractor: StagedExtractor,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        Self {
            config,
            feed,
            downloader,
            extractor,
            launcher,
        }
    }

    /// Run one update pass. This never fails: every unrecovered error
    /// converges on the browser fallback and is reported in the outcome.
    pub fn run(&self) -> RunOutcome {
        let swept = sweeper::sweep(&self.config.install_root, &self.config.marker_extensions);
        if swept > 0 {
            tracing::info!(swept, "cleared leftover temp files");
        }

        match self.apply_pending() {
            Ok(None) => {
                tracing::info!("already up to date");
                RunOutcome::UpToDate
            }
            Ok(Some(applied)) => {
                tracing::info!(?applied, "successfully updated");
                RunOutcome::Updated { applied }
            }
            Err(error) => {
                tracing::warn!(%error, "update run aborted, falling back to manual download");
                if let Err(e) = self.launcher.open_url(&self.config.latest_release_url()) {
                    tracing::warn!(%e, "could not open the latest-release page");
                }
                RunOutcome::Fallback { error }
            }
        }
    }

    /// Apply every pending release in order, then relaunch the app.
    /// Returns `None` when the feed has nothing pending.
    fn apply_pending(&self) -> Result<Option<Vec<String>>> {
        let releases = self.feed.list_releases()?;
        let pending = self.config.pending_policy.pending(releases);
        if pending.is_empty() {
            return Ok(None);
        }

        let mut applied = Vec::with_capacity(pending.len());
        for release in &pending {
            tracing::info!(tag = %release.tag, "updating to release");
            let asset = release.archive_asset(&self.config.archive_extension)?;
            let archive = self.downloader.download(&asset.download_url, &release.tag)?;
            self.extractor.extract_archive(&archive)?;
            // The extractor already delivered the files; a leftover archive
            // is a nuisance, not a failure.
            if let Err(e) = std::fs::remove_file(&archive) {
                tracing::debug!(archive = %archive.display(), error = %e, "leaving archive behind");
            }
            applied.push(release.tag.clone());
        }

        self.launcher.launch_app(&self.config.app_path())?;
        Ok(Some(applied))
    }
}
