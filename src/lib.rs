//! Self-updater for the Cadence desktop app.
//!
//! One pass per invocation: sweep leftover temp files, list pending releases
//! from the GitHub feed, then per release download the zip asset, extract it
//! into the installation tree (staging anything under the reserved updater
//! directory, which backs this process's own running image), and relaunch
//! the app. Any unrecovered error falls back to opening the latest-release
//! page in the browser; the process always exits successfully.
//!
//! # Architecture
//!
//! - **sweeper**: removes partial-download/partial-overwrite artifacts
//! - **release**: GitHub feed client, asset selection, pending policy
//! - **download**: streams assets to tag-named files via `ureq`
//! - **archive** / **extractor**: zip codec seam + staged extraction
//! - **orchestrator**: the all-or-nothing state machine

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod release;
pub mod sweeper;

pub use config::UpdaterConfig;
pub use error::{Result, UpdateError};
pub use orchestrator::{Launcher, Orchestrator, RunOutcome, SystemLauncher};
pub use release::{GithubFeed, PendingPolicy, Release, ReleaseFeed};
