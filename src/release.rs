//! Release feed model and GitHub client.
//!
//! Queries the GitHub releases API, selects the archive asset to download
//! per release, and decides which releases are pending application.

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Asset file name, e.g. `cadence-v2.0.zip`.
    pub name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// A published version of the application. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Release tag, e.g. `v2.0.4`.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Downloadable assets, in feed order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Version string from the tag (`v` prefix stripped).
    pub fn version(&self) -> &str {
        self.tag.strip_prefix('v').unwrap_or(&self.tag)
    }

    /// The first asset whose name ends (case-insensitively) with the
    /// expected archive extension.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::AssetNotFound`] when no asset matches.
    pub fn archive_asset(&self, extension: &str) -> Result<&Asset> {
        let wanted = extension.to_lowercase();
        self.assets
            .iter()
            .find(|a| a.name.to_lowercase().ends_with(&wanted))
            .ok_or_else(|| UpdateError::AssetNotFound {
                tag: self.tag.clone(),
                extension: extension.to_owned(),
            })
    }
}

/// Which of the feed's releases are pending application.
///
/// The original tool applied every release the feed returned; that is kept
/// available as [`PendingPolicy::ApplyAll`], but the default filters to
/// releases newer than the version this updater shipped with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// Apply every release the feed returns, in feed order.
    ApplyAll,
    /// Apply only releases whose tag is a version newer than the given one,
    /// oldest first.
    NewerThan(String),
}

impl Default for PendingPolicy {
    fn default() -> Self {
        Self::NewerThan(env!("CARGO_PKG_VERSION").to_owned())
    }
}

impl PendingPolicy {
    /// Filter and order the feed's releases into the list to apply.
    pub fn pending(&self, releases: Vec<Release>) -> Vec<Release> {
        match self {
            Self::ApplyAll => releases,
            Self::NewerThan(current) => {
                let mut pending: Vec<Release> = releases
                    .into_iter()
                    .filter(|r| compare_versions(r.version(), current) == Ordering::Greater)
                    .collect();
                // Stable sort: non-version tags keep their feed order.
                pending.sort_by(|a, b| compare_versions(a.version(), b.version()));
                pending
            }
        }
    }
}

/// Compare two version strings (semver-like, `v` prefix tolerated).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.strip_prefix('v').unwrap_or(a);
    let b = b.strip_prefix('v').unwrap_or(b);

    let (a_nums, a_pre) = parse_version(a);
    let (b_nums, b_pre) = parse_version(b);

    match a_nums.cmp(&b_nums) {
        Ordering::Equal => match (a_pre.is_empty(), b_pre.is_empty()) {
            // A release without a prerelease suffix is newer than one with.
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => a_pre.cmp(&b_pre),
        },
        other => other,
    }
}

/// Parse `major.minor.patch-prerelease` into comparable parts.
fn parse_version(version: &str) -> ((u32, u32, u32), String) {
    let (numbers, prerelease) = match version.split_once('-') {
        Some((n, p)) => (n, p.to_owned()),
        None => (version, String::new()),
    };

    let nums: Vec<u32> = numbers
        .split('.')
        .filter_map(|s| s.parse().ok())
        .collect();

    (
        (
            nums.first().copied().unwrap_or(0),
            nums.get(1).copied().unwrap_or(0),
            nums.get(2).copied().unwrap_or(0),
        ),
        prerelease,
    )
}

/// Source of releases for an update run.
pub trait ReleaseFeed {
    /// List releases in the order they must be applied (oldest pending
    /// first).
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be reached or parsed.
    fn list_releases(&self) -> Result<Vec<Release>>;
}

/// Production release feed backed by the GitHub releases API.
pub struct GithubFeed {
    agent: ureq::Agent,
    releases_url: String,
    user_agent: String,
}

impl GithubFeed {
    /// Build a feed client for the configured repository.
    pub fn new(config: &UpdaterConfig) -> Self {
        Self::with_api_base(config, "https://api.github.com")
    }

    /// Build a feed client against an alternate API base URL (tests).
    pub fn with_api_base(config: &UpdaterConfig, api_base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_s))
            .timeout_read(Duration::from_secs(config.read_timeout_s))
            .build();
        Self {
            agent,
            releases_url: config.releases_api_url(api_base),
            user_agent: format!("cadence-updater/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReleaseFeed for GithubFeed {
    fn list_releases(&self) -> Result<Vec<Release>> {
        let resp = self
            .agent
            .get(&self.releases_url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/vnd.github.v3+json")
            .call()
            .map_err(|e| UpdateError::Feed(format!("cannot list releases: {e}")))?;

        let mut releases: Vec<Release> = serde_json::from_reader(resp.into_reader())
            .map_err(|e| UpdateError::Feed(format!("cannot parse release feed: {e}")))?;

        // GitHub lists newest first; application order is oldest first.
        releases.reverse();
        Ok(releases)
    }
}
