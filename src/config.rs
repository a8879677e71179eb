//! Updater configuration.
//!
//! Everything the original tool read from ambient process state (current
//! directory, fixed file names, repository coordinates) is an explicit field
//! here, threaded into each component.

use crate::error::{Result, UpdateError};
use crate::release::PendingPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix given to an asset while it is still streaming to disk.
pub const PARTIAL_DOWNLOAD_EXT: &str = ".tmp";

/// Suffix given to a file that is queued for replacement on next launch.
pub const PARTIAL_OVERWRITE_EXT: &str = ".pending-overwrite";

/// Configuration for an update run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Root of the installation tree (contains the app executable and the
    /// reserved updater subdirectory).
    pub install_root: PathBuf,
    /// Name of the subdirectory reserved for the updater's own files.
    ///
    /// Archive entries under this directory are never written in place while
    /// the updater is running from it; they are staged instead.
    pub reserved_dir: String,
    /// Name of the staging directory that receives reserved-directory
    /// entries, pending the swap performed on next launch.
    pub staging_dir: String,
    /// File name of the main application executable within `install_root`.
    pub app_executable: String,
    /// GitHub repository owner.
    pub repo_owner: String,
    /// GitHub repository name.
    pub repo_name: String,
    /// Expected archive asset extension.
    pub archive_extension: String,
    /// File name suffixes the sweeper treats as disposable, anywhere under
    /// `install_root`.
    pub marker_extensions: Vec<String>,
    /// Which of the feed's releases are pending application.
    pub pending_policy: PendingPolicy,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_s: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_s: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("."),
            reserved_dir: "Updater".to_owned(),
            staging_dir: "tmp_updater".to_owned(),
            app_executable: default_app_executable().to_owned(),
            repo_owner: "cadence-app".to_owned(),
            repo_name: "cadence".to_owned(),
            archive_extension: ".zip".to_owned(),
            marker_extensions: vec![
                PARTIAL_DOWNLOAD_EXT.to_owned(),
                PARTIAL_OVERWRITE_EXT.to_owned(),
            ],
            pending_policy: PendingPolicy::default(),
            connect_timeout_s: 15,
            read_timeout_s: 300,
        }
    }
}

/// Returns the expected app executable name for the current platform.
fn default_app_executable() -> &'static str {
    if cfg!(target_os = "windows") {
        "cadence.exe"
    } else {
        "cadence"
    }
}

impl UpdaterConfig {
    /// Full path to the main application executable.
    pub fn app_path(&self) -> PathBuf {
        self.install_root.join(&self.app_executable)
    }

    /// Full path to the staging directory for reserved-directory entries.
    pub fn staging_path(&self) -> PathBuf {
        self.install_root.join(&self.staging_dir)
    }

    /// GitHub API endpoint listing all releases for the configured repo.
    pub fn releases_api_url(&self, api_base: &str) -> String {
        format!(
            "{api_base}/repos/{}/{}/releases",
            self.repo_owner, self.repo_name
        )
    }

    /// Web page of the latest release, used as the manual-update fallback.
    pub fn latest_release_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/releases/latest",
            self.repo_owner, self.repo_name
        )
    }

    /// Build a config rooted at the tree the updater executable lives in.
    ///
    /// The updater ships inside `<install_root>/<reserved_dir>/`, so the
    /// install root is the parent of the executable's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable path cannot be determined
    /// or has no grandparent directory.
    pub fn detect() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| {
            UpdateError::Config(format!("cannot determine updater executable path: {e}"))
        })?;
        let root = exe
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| {
                UpdateError::Config(format!(
                    "updater executable {} has no installation root",
                    exe.display()
                ))
            })?
            .to_path_buf();

        Ok(Self {
            install_root: root,
            ..Self::default()
        })
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| UpdateError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| UpdateError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
