//! Asset downloader.
//!
//! Streams a release asset to the installation root under a name derived
//! from the release tag, so re-running after a crash overwrites instead of
//! accumulating. Bytes stream to a `.tmp`-suffixed path and are renamed to
//! the plain name only on success; a crash mid-download leaves an artifact
//! the sweeper removes on the next run.

use crate::config::{PARTIAL_DOWNLOAD_EXT, UpdaterConfig};
use crate::error::{Result, UpdateError};
use std::path::PathBuf;
use std::time::Duration;

/// Downloads one asset per release for the orchestrator.
pub trait AssetDownloader {
    /// Stream `url` to a local file named after `tag` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::DownloadFailed`] on any network, timeout, or
    /// disk-write error, including an empty response body.
    fn download(&self, url: &str, tag: &str) -> Result<PathBuf>;
}

/// Production downloader backed by `ureq`.
pub struct HttpDownloader {
    config: UpdaterConfig,
    agent: ureq::Agent,
}

impl HttpDownloader {
    pub fn new(config: UpdaterConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_s))
            .timeout_read(Duration::from_secs(config.read_timeout_s))
            .build();
        Self { config, agent }
    }

    /// Final on-disk path for a release tag's archive.
    pub fn archive_path(&self, tag: &str) -> PathBuf {
        self.config
            .install_root
            .join(format!("{tag}{}", self.config.archive_extension))
    }

    fn download_failed(url: &str, reason: impl std::fmt::Display) -> UpdateError {
        UpdateError::DownloadFailed {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl AssetDownloader for HttpDownloader {
    fn download(&self, url: &str, tag: &str) -> Result<PathBuf> {
        let final_path = self.archive_path(tag);
        let partial_path = PathBuf::from(format!(
            "{}{PARTIAL_DOWNLOAD_EXT}",
            final_path.display()
        ));

        tracing::info!(%url, tag, "downloading release asset");

        let resp = self
            .agent
            .get(url)
            .set("User-Agent", &format!("cadence-updater/{}", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| Self::download_failed(url, e))?;

        let mut reader = resp.into_reader();
        let mut file = std::fs::File::create(&partial_path).map_err(|e| {
            Self::download_failed(url, format!("cannot create {}: {e}", partial_path.display()))
        })?;

        let written = std::io::copy(&mut reader, &mut file)
            .map_err(|e| Self::download_failed(url, format!("write failed: {e}")))?;
        drop(file);

        // A zero-byte body is a truncated or blocked download, not a release.
        // The partial file is left behind for the sweeper.
        if written == 0 {
            return Err(Self::download_failed(url, "empty response body"));
        }

        std::fs::rename(&partial_path, &final_path).map_err(|e| {
            Self::download_failed(url, format!("cannot finalize download: {e}"))
        })?;

        tracing::info!(path = %final_path.display(), bytes = written, "download complete");
        Ok(final_path)
    }
}
