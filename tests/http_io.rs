//! HTTP integration tests for the release feed and the downloader.
//!
//! `wiremock` runs on the tokio runtime while the `ureq`-based clients are
//! blocking, so each client call goes through `spawn_blocking`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cadence_updater::config::PARTIAL_DOWNLOAD_EXT;
use cadence_updater::download::{AssetDownloader, HttpDownloader};
use cadence_updater::release::GithubFeed;
use cadence_updater::{PendingPolicy, ReleaseFeed, UpdateError, UpdaterConfig};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(root: &Path) -> UpdaterConfig {
    UpdaterConfig {
        install_root: root.to_path_buf(),
        pending_policy: PendingPolicy::ApplyAll,
        connect_timeout_s: 5,
        read_timeout_s: 5,
        ..UpdaterConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn feed_lists_releases_oldest_first() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    // GitHub returns newest first.
    Mock::given(method("GET"))
        .and(path("/repos/cadence-app/cadence/releases"))
        .and(header("Accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"tag_name": "v2.1.0", "assets": []},
            {"tag_name": "v2.0.0", "assets": [
                {"name": "cadence-v2.0.0.zip",
                 "browser_download_url": "https://example.com/cadence-v2.0.0.zip"}
            ]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let feed = GithubFeed::with_api_base(&config, &server.uri());
    let releases = tokio::task::spawn_blocking(move || feed.list_releases())
        .await
        .unwrap()
        .unwrap();

    let tags: Vec<&str> = releases.iter().map(|r| r.tag.as_str()).collect();
    assert_eq!(tags, vec!["v2.0.0", "v2.1.0"]);
    assert_eq!(releases[1].assets.len(), 0);
    assert_eq!(releases[0].assets[0].name, "cadence-v2.0.0.zip");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn feed_server_error_is_feed_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    Mock::given(method("GET"))
        .and(path("/repos/cadence-app/cadence/releases"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = GithubFeed::with_api_base(&config, &server.uri());
    let err = tokio::task::spawn_blocking(move || feed.list_releases())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, UpdateError::Feed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_streams_to_tag_named_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    Mock::given(method("GET"))
        .and(path("/cadence-v2.0.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = HttpDownloader::new(config);
    let url = format!("{}/cadence-v2.0.zip", server.uri());
    let downloaded = tokio::task::spawn_blocking(move || downloader.download(&url, "v2.0"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(downloaded, dir.path().join("v2.0.zip"));
    assert_eq!(std::fs::read(&downloaded).unwrap(), b"zip bytes");
    // The in-flight marker was renamed away on success.
    assert!(!dir.path().join(format!("v2.0.zip{PARTIAL_DOWNLOAD_EXT}")).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_rerun_overwrites_same_name() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    Mock::given(method("GET"))
        .and(path("/cadence-v2.0.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second".to_vec()))
        .mount(&server)
        .await;

    std::fs::write(dir.path().join("v2.0.zip"), b"first").unwrap();

    let downloader = HttpDownloader::new(config);
    let url = format!("{}/cadence-v2.0.zip", server.uri());
    let downloaded = tokio::task::spawn_blocking(move || downloader.download(&url, "v2.0"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(std::fs::read(&downloaded).unwrap(), b"second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_http_error_is_download_failed() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    Mock::given(method("GET"))
        .and(path("/cadence-v2.0.zip"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let downloader = HttpDownloader::new(config);
    let url = format!("{}/cadence-v2.0.zip", server.uri());
    let err = tokio::task::spawn_blocking(move || downloader.download(&url, "v2.0"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, UpdateError::DownloadFailed { .. }));
    assert!(!dir.path().join("v2.0.zip").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_body_is_download_failed_and_leaves_partial_for_sweeper() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    Mock::given(method("GET"))
        .and(path("/cadence-v2.0.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
        .mount(&server)
        .await;

    let downloader = HttpDownloader::new(config.clone());
    let url = format!("{}/cadence-v2.0.zip", server.uri());
    let err = tokio::task::spawn_blocking(move || downloader.download(&url, "v2.0"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, UpdateError::DownloadFailed { .. }));
    assert!(!dir.path().join("v2.0.zip").exists());

    // The partial file is the sweeper's problem, by convention.
    let partial = dir.path().join(format!("v2.0.zip{PARTIAL_DOWNLOAD_EXT}"));
    assert!(partial.exists());
    cadence_updater::sweeper::sweep(dir.path(), &config.marker_extensions);
    assert!(!partial.exists());
}
