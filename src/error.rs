//! Error types for the updater.

use std::path::PathBuf;

/// Top-level error type for an update run.
///
/// Every failure in the fetch/download/extract path maps to one of these
/// variants; the orchestrator is the single point that converts any of them
/// into the browser fallback. Cleanup failures have no variant on purpose:
/// the sweeper swallows them.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The release has no asset matching the expected archive extension.
    #[error("release {tag} has no {extension} asset")]
    AssetNotFound { tag: String, extension: String },

    /// Network, timeout, or disk error while streaming an asset.
    #[error("download from {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Error while reading or writing archive entries.
    ///
    /// The archive is left on disk at `archive` so the user can extract it
    /// manually. `access_denied` is set when the underlying cause was a
    /// permission/lock error (running app or antivirus holding files open).
    #[error("extraction of {} failed: {reason}", archive.display())]
    ExtractionFailed {
        archive: PathBuf,
        reason: String,
        access_denied: bool,
    },

    /// Release feed error (listing releases, parsing feed JSON).
    #[error("release feed error: {0}")]
    Feed(String),

    /// Failed to start the application or open the fallback URL.
    #[error("launch error: {0}")]
    Launch(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdateError>;
