//! Raw-response audit artifacts.
//!
//! Each successful probe captures the response it saw; the batch runner
//! persists the captures through an [`AuditSink`] after the join barrier, so
//! file writes never race and a failed write never touches an outcome. Tests
//! substitute the in-memory sink.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error_handling::ArtifactWriteError;

/// A captured HTTP response: headers plus a truncated body snippet.
#[derive(Debug, Clone)]
pub struct ResponseArtifact {
    pub host: String,
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_snippet: String,
    pub captured_at: DateTime<Utc>,
}

impl ResponseArtifact {
    pub fn new(
        host: &str,
        requested_url: &str,
        final_url: &str,
        status: u16,
        headers: &HeaderMap,
        body_snippet: String,
    ) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        ResponseArtifact {
            host: host.to_string(),
            requested_url: requested_url.to_string(),
            final_url: final_url.to_string(),
            status,
            headers,
            body_snippet,
            captured_at: Utc::now(),
        }
    }

    /// File name for this artifact; port separators are not valid in file
    /// names everywhere, so `:` becomes `_`.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.host.replace(':', "_"))
    }

    /// Renders the artifact as plain text.
    pub fn to_text(&self) -> String {
        let mut content = String::new();
        content.push_str(&format!("URL: {}\n", self.requested_url));
        content.push_str(&format!("Final URL: {}\n", self.final_url));
        content.push_str(&format!("Status Code: {}\n", self.status));
        content.push_str(&format!("Captured At: {}\n\n", self.captured_at.to_rfc3339()));

        content.push_str("Headers:\n");
        for (name, value) in &self.headers {
            content.push_str(&format!("{name}: {value}\n"));
        }

        content.push_str(&format!(
            "\nContent Snippet (first {} characters):\n",
            crate::config::BODY_SNIPPET_LEN
        ));
        content.push_str(&self.body_snippet);
        content
    }
}

/// Destination for response artifacts.
///
/// Injected into the batch runner so tests can observe or fail writes without
/// touching the filesystem.
pub trait AuditSink: Send + Sync {
    fn record(&self, artifact: &ResponseArtifact) -> Result<(), ArtifactWriteError>;
}

/// Writes artifacts as text files into a directory.
#[derive(Debug)]
pub struct FsAuditSink {
    dir: PathBuf,
}

impl FsAuditSink {
    pub fn new(dir: PathBuf) -> Self {
        FsAuditSink { dir }
    }
}

impl AuditSink for FsAuditSink {
    fn record(&self, artifact: &ResponseArtifact) -> Result<(), ArtifactWriteError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactWriteError::CreateDir {
            dir: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(artifact.file_name());
        std::fs::write(&path, artifact.to_text()).map_err(|source| ArtifactWriteError::Io {
            path: path.clone(),
            source,
        })
    }
}

/// Collects artifacts in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<ResponseArtifact>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ResponseArtifact> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, artifact: &ResponseArtifact) -> Result<(), ArtifactWriteError> {
        self.records.lock().unwrap().push(artifact.clone());
        Ok(())
    }
}
