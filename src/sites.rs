//! Site list loading and host normalization.

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Maximum host length to accept from the input list.
/// Matches common server limits and guards against garbage lines.
const MAX_HOST_LENGTH: usize = 253;

/// Validates and normalizes one line of the site list into a bare host.
///
/// Accepts `host` or `host:port`; a leading `http://` or `https://` is stripped
/// so lists of full URLs still load (the scheme is chosen per probe attempt,
/// not taken from the input). Logs a warning and returns None for lines that
/// do not parse as a host.
pub fn normalize_host(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if host.is_empty() || host.len() > MAX_HOST_LENGTH {
        warn!("Skipping invalid host (empty or too long): {trimmed}");
        return None;
    }

    if host.contains(char::is_whitespace) || host.contains('/') {
        warn!("Skipping invalid host: {trimmed}");
        return None;
    }

    // Validate by parsing as the authority of an https URL
    match url::Url::parse(&format!("https://{host}")) {
        Ok(parsed) if parsed.host_str().is_some() => Some(host.to_string()),
        _ => {
            warn!("Skipping unparseable host: {trimmed}");
            None
        }
    }
}

/// Reads the newline-delimited site list.
///
/// Blank lines and `#` comment lines are ignored; invalid lines are skipped
/// with a warning. Only an unreadable file aborts the run.
pub async fn load_sites(path: &Path) -> Result<Vec<String>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open site list {}", path.display()))?;

    let mut sites = Vec::new();
    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read line from site list")?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(host) = normalize_host(trimmed) {
            sites.push(host);
        }
    }

    info!("Loaded {} site(s) from {}", sites.len(), path.display());
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_host_bare_hostname() {
        assert_eq!(normalize_host("example.com"), Some("example.com".to_string()));
    }

    #[test]
    fn test_normalize_host_strips_scheme() {
        assert_eq!(
            normalize_host("https://example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_host("http://example.com/"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_normalize_host_keeps_port() {
        assert_eq!(
            normalize_host("example.com:8080"),
            Some("example.com:8080".to_string())
        );
    }

    #[test]
    fn test_normalize_host_rejects_paths_and_garbage() {
        assert_eq!(normalize_host("example.com/path"), None);
        assert_eq!(normalize_host("not a host"), None);
        assert_eq!(normalize_host(""), None);
        assert_eq!(normalize_host("   "), None);
    }

    #[test]
    fn test_normalize_host_rejects_too_long() {
        let long = "a".repeat(300);
        assert_eq!(normalize_host(&long), None);
    }

    #[tokio::test]
    async fn test_load_sites_skips_blank_and_comment_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "  other.org  ").unwrap();
        file.flush().unwrap();

        let sites = load_sites(file.path()).await.unwrap();
        assert_eq!(sites, vec!["example.com".to_string(), "other.org".to_string()]);
    }

    #[tokio::test]
    async fn test_load_sites_preserves_input_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for host in ["c.com", "a.com", "b.com"] {
            writeln!(file, "{host}").unwrap();
        }
        file.flush().unwrap();

        let sites = load_sites(file.path()).await.unwrap();
        assert_eq!(sites, vec!["c.com", "a.com", "b.com"]);
    }

    #[tokio::test]
    async fn test_load_sites_missing_file_is_an_error() {
        let result = load_sites(Path::new("/nonexistent/sites.txt")).await;
        assert!(result.is_err());
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_normalize_host_idempotent(host in "[a-z]{3,20}\\.[a-z]{2,5}") {
            let normalized = normalize_host(&host);
            if let Some(n1) = normalized {
                let n2 = normalize_host(&n1);
                prop_assert_eq!(Some(n1), n2, "Normalizing twice should produce same result");
            }
        }

        #[test]
        fn test_normalize_host_no_panic(line in ".{0,300}") {
            // Should not panic on any input line
            let _ = normalize_host(&line);
        }

        #[test]
        fn test_normalize_host_scheme_stripped(host in "[a-z]{3,20}\\.[a-z]{2,5}") {
            let with_scheme = format!("https://{host}");
            prop_assert_eq!(normalize_host(&with_scheme), Some(host));
        }
    }
}
