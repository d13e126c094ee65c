//! Shared test helpers for site-list and configuration setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use frame_check::Config;
use wiremock::MockServer;

/// Writes a site list into a temp directory; the `TempDir` must be kept alive
/// by the caller for the duration of the test.
#[allow(dead_code)] // Used by individual test files
pub fn write_sites_file(hosts: &[&str]) -> (PathBuf, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("sites.txt");
    let mut file = std::fs::File::create(&path).expect("Failed to create sites file");
    for host in hosts {
        writeln!(file, "{host}").expect("Failed to write sites file");
    }
    (path, dir)
}

/// A test configuration with short timeouts, writing its report next to the
/// given site list.
#[allow(dead_code)]
pub fn test_config(file: &Path) -> Config {
    Config {
        file: file.to_path_buf(),
        out_dir: file.parent().expect("sites file has a parent").join("out"),
        timeout_seconds: 5,
        max_concurrency: 8,
        ..Default::default()
    }
}

/// The `host:port` a mock server listens on, as it would appear in a site
/// list (no scheme).
#[allow(dead_code)]
pub fn mock_host(server: &MockServer) -> String {
    server
        .uri()
        .strip_prefix("http://")
        .expect("mock server uri is http")
        .to_string()
}
