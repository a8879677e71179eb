//! Cadence self-updater binary.
//!
//! Invoked by the app when an update is available. Runs one update pass and
//! always exits with a success status: on failure the user has already been
//! pointed at the latest-release page, so there is nothing for a caller to
//! retry.

use cadence_updater::archive::ZipOpener;
use cadence_updater::download::HttpDownloader;
use cadence_updater::extractor::StagedExtractor;
use cadence_updater::{
    GithubFeed, Orchestrator, RunOutcome, SystemLauncher, UpdateError, UpdaterConfig,
};
use std::io::BufRead;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    tracing::info!(root = %config.install_root.display(), "cadence-updater starting");

    let orchestrator = Orchestrator::new(
        config.clone(),
        Box::new(GithubFeed::new(&config)),
        Box::new(HttpDownloader::new(config.clone())),
        StagedExtractor::new(config.clone(), Box::new(ZipOpener)),
        Box::new(SystemLauncher),
    );

    match orchestrator.run() {
        RunOutcome::UpToDate => println!("Cadence is already up to date."),
        RunOutcome::Updated { applied } => {
            println!("Successfully updated ({}).", applied.join(", "));
        }
        RunOutcome::Fallback { error } => {
            report_failure(&error);
            hold_console();
        }
    }
}

/// TOML config next to the updater executable wins; otherwise the install
/// root is derived from the executable's location.
fn load_config() -> UpdaterConfig {
    let config_file = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join("updater.toml")));

    if let Some(path) = config_file
        && path.exists()
    {
        match UpdaterConfig::from_file(&path) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring bad config file"),
        }
    }

    UpdaterConfig::detect().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "cannot locate installation root, using working directory");
        UpdaterConfig::default()
    })
}

/// Console diagnostics naming the failure category, mirroring what the
/// browser fallback cannot convey.
fn report_failure(error: &UpdateError) {
    match error {
        UpdateError::AssetNotFound { .. } | UpdateError::DownloadFailed { .. } => {
            println!("Something went wrong during the download.");
            println!("Make sure it was not blocked by your antivirus software.");
        }
        UpdateError::ExtractionFailed { archive, access_denied, .. } => {
            println!("An error occurred while extracting.");
            if *access_denied {
                println!(
                    "Make sure Cadence is not running and no antivirus software is interfering."
                );
            }
            println!("You can extract the file manually at: {}", archive.display());
        }
        _ => println!("Something went wrong during the update."),
    }
    println!("Error message: {error}");
    println!("The latest-release page has been opened for a manual download.");
}

fn hold_console() {
    println!("Press Enter to exit");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
